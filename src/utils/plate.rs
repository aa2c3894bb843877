pub const MIN_PLATE_LEN: usize = 5;
pub const MAX_PLATE_LEN: usize = 8;

/// Uppercase the plate and drop every whitespace character.
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Long enough to be worth a lookup.
pub fn is_lookup_ready(plate: &str) -> bool {
    plate.chars().count() >= MIN_PLATE_LEN
}

pub fn is_valid_plate(plate: &str) -> bool {
    let len = plate.chars().count();
    (MIN_PLATE_LEN..=MAX_PLATE_LEN).contains(&len)
        && plate.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
