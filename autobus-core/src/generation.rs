use rand::Rng;
use uuid::Uuid;

use autobus_types::{PlayerId, RoomCode};

pub const ROOM_CODE_LENGTH: usize = 6;

pub const ALPHABET: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Six uppercase base-36 characters. Uniqueness across rooms is not checked.
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    (0..ROOM_CODE_LENGTH)
        .map(|_| BASE36_DIGITS[rng.random_range(0..BASE36_DIGITS.len())] as char)
        .collect()
}

/// Uniform over the alphabet; earlier rounds are not excluded.
pub fn random_letter<R: Rng + ?Sized>(rng: &mut R) -> char {
    ALPHABET[rng.random_range(0..ALPHABET.len())]
}

pub fn new_player_id() -> PlayerId {
    Uuid::new_v4().simple().to_string()
}

/// Trims, upper-cases and truncates user input to a room code.
pub fn normalize_room_code(input: &str) -> RoomCode {
    input
        .trim()
        .chars()
        .take(ROOM_CODE_LENGTH)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
