/*++

Licensed under the Apache-2.0 license.

File Name:

    aes128.rs

Abstract:

    File contains the AES-128 round engine: the state transforms and a
    stepped cipher that advances one round at a time.

--*/

use crate::key_schedule::KeySchedule;
use crate::sbox::{gf_mul, inv_sub_byte, sub_byte};

/// AES-128 Block Size
pub const AES_128_BLOCK_SIZE: usize = 16;

/// AES-128 Key Size
pub const AES_128_KEY_SIZE: usize = 16;

/// Number of rounds in AES-128
pub const AES_128_ROUNDS: usize = 10;

/// The 4x4 state is kept as a flat 16-byte array in AES column-major order:
/// state byte (row r, column c) lives at index `4 * c + r`.
type State = [u8; AES_128_BLOCK_SIZE];

/// Apply the forward S-box to every state byte
pub fn sub_bytes(state: &mut State) {
    for b in state.iter_mut() {
        *b = sub_byte(*b);
    }
}

/// Apply the inverse S-box to every state byte
pub fn inv_sub_bytes(state: &mut State) {
    for b in state.iter_mut() {
        *b = inv_sub_byte(*b);
    }
}

/// Cyclically rotate row `r` left by `r` byte positions
pub fn shift_rows(state: &mut State) {
    let old = *state;
    for r in 1..4 {
        for c in 0..4 {
            state[r + 4 * c] = old[r + 4 * ((c + r) % 4)];
        }
    }
}

/// Cyclically rotate row `r` right by `r` byte positions
pub fn inv_shift_rows(state: &mut State) {
    let old = *state;
    for r in 1..4 {
        for c in 0..4 {
            state[r + 4 * c] = old[r + 4 * ((c + 4 - r) % 4)];
        }
    }
}

/// Multiply each column by the forward MDS matrix {2,3,1,1}
pub fn mix_columns(state: &mut State) {
    for c in 0..4 {
        let col: [u8; 4] = state[4 * c..4 * c + 4].try_into().unwrap();
        state[4 * c] = gf_mul(col[0], 2) ^ gf_mul(col[1], 3) ^ col[2] ^ col[3];
        state[4 * c + 1] = col[0] ^ gf_mul(col[1], 2) ^ gf_mul(col[2], 3) ^ col[3];
        state[4 * c + 2] = col[0] ^ col[1] ^ gf_mul(col[2], 2) ^ gf_mul(col[3], 3);
        state[4 * c + 3] = gf_mul(col[0], 3) ^ col[1] ^ col[2] ^ gf_mul(col[3], 2);
    }
}

/// Multiply each column by the inverse MDS matrix {14,11,13,9}
pub fn inv_mix_columns(state: &mut State) {
    for c in 0..4 {
        let col: [u8; 4] = state[4 * c..4 * c + 4].try_into().unwrap();
        state[4 * c] =
            gf_mul(col[0], 14) ^ gf_mul(col[1], 11) ^ gf_mul(col[2], 13) ^ gf_mul(col[3], 9);
        state[4 * c + 1] =
            gf_mul(col[0], 9) ^ gf_mul(col[1], 14) ^ gf_mul(col[2], 11) ^ gf_mul(col[3], 13);
        state[4 * c + 2] =
            gf_mul(col[0], 13) ^ gf_mul(col[1], 9) ^ gf_mul(col[2], 14) ^ gf_mul(col[3], 11);
        state[4 * c + 3] =
            gf_mul(col[0], 11) ^ gf_mul(col[1], 13) ^ gf_mul(col[2], 9) ^ gf_mul(col[3], 14);
    }
}

/// XOR the state with a 16-byte round key, byte for byte
pub fn add_round_key(state: &mut State, round_key: &[u8; 16]) {
    for (b, k) in state.iter_mut().zip(round_key.iter()) {
        *b ^= k;
    }
}

/// AES-128 Operation
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AesOp {
    Encrypt,
    Decrypt,
}

/// Stepped AES-128 cipher.
///
/// Holds the expanded key schedule and the working state, and advances one
/// round per call so a controller can pace the rounds against simulated
/// time. The round sequencing is the standard AES-128 structure:
///
/// * Encrypt: `load_block` applies AddRoundKey with round key 0; rounds
///   1..=9 apply SubBytes, ShiftRows, MixColumns, AddRoundKey; round 10
///   omits MixColumns.
/// * Decrypt: `load_block` applies AddRoundKey with round key 10; rounds
///   1..=9 apply InvShiftRows, InvSubBytes, AddRoundKey, InvMixColumns,
///   consuming round keys 9 down to 1; round 10 omits InvMixColumns and
///   consumes round key 0.
pub struct Aes128 {
    /// Operation the schedule and rounds are set up for
    op: AesOp,

    /// Expanded round key schedule
    key_schedule: KeySchedule,

    /// Working state
    state: State,
}

impl Aes128 {
    /// Create a new cipher for the given operation, expanding the key
    /// schedule eagerly.
    pub fn new(op: AesOp, key: &[u8; AES_128_KEY_SIZE]) -> Self {
        Self {
            op,
            key_schedule: KeySchedule::expand(key),
            state: [0; AES_128_BLOCK_SIZE],
        }
    }

    /// Load the input block and apply the initial AddRoundKey.
    pub fn load_block(&mut self, block: &[u8; AES_128_BLOCK_SIZE]) {
        self.state = *block;
        let initial_key = match self.op {
            AesOp::Encrypt => self.key_schedule.round_key(0),
            AesOp::Decrypt => self.key_schedule.round_key(AES_128_ROUNDS),
        };
        add_round_key(&mut self.state, initial_key);
    }

    /// Apply round `round` (1..=10) to the working state.
    pub fn round(&mut self, round: usize) {
        debug_assert!((1..=AES_128_ROUNDS).contains(&round));
        match self.op {
            AesOp::Encrypt => {
                sub_bytes(&mut self.state);
                shift_rows(&mut self.state);
                if round < AES_128_ROUNDS {
                    mix_columns(&mut self.state);
                }
                add_round_key(&mut self.state, self.key_schedule.round_key(round));
            }
            AesOp::Decrypt => {
                inv_shift_rows(&mut self.state);
                inv_sub_bytes(&mut self.state);
                add_round_key(
                    &mut self.state,
                    self.key_schedule.round_key(AES_128_ROUNDS - round),
                );
                if round < AES_128_ROUNDS {
                    inv_mix_columns(&mut self.state);
                }
            }
        }
    }

    /// Current working state; after round 10 this is the output block.
    pub fn block(&self) -> &[u8; AES_128_BLOCK_SIZE] {
        &self.state
    }
}

/// Encrypt a single block, running all rounds back to back.
pub fn encrypt_block(
    key: &[u8; AES_128_KEY_SIZE],
    block: &[u8; AES_128_BLOCK_SIZE],
) -> [u8; AES_128_BLOCK_SIZE] {
    let mut aes = Aes128::new(AesOp::Encrypt, key);
    aes.load_block(block);
    for round in 1..=AES_128_ROUNDS {
        aes.round(round);
    }
    *aes.block()
}

/// Decrypt a single block, running all rounds back to back.
pub fn decrypt_block(
    key: &[u8; AES_128_KEY_SIZE],
    block: &[u8; AES_128_BLOCK_SIZE],
) -> [u8; AES_128_BLOCK_SIZE] {
    let mut aes = Aes128::new(AesOp::Decrypt, key);
    aes.load_block(block);
    for round in 1..=AES_128_ROUNDS {
        aes.round(round);
    }
    *aes.block()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::{BlockEncrypt, KeyInit};

    // FIPS-197 Appendix B key and input
    const FIPS_B_KEY: [u8; 16] = [
        0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f,
        0x3c,
    ];
    const FIPS_B_PLAINTEXT: [u8; 16] = [
        0x32, 0x43, 0xf6, 0xa8, 0x88, 0x5a, 0x30, 0x8d, 0x31, 0x31, 0x98, 0xa2, 0xe0, 0x37, 0x07,
        0x34,
    ];
    const FIPS_B_CIPHERTEXT: [u8; 16] = [
        0x39, 0x25, 0x84, 0x1d, 0x02, 0xdc, 0x09, 0xfb, 0xdc, 0x11, 0x85, 0x97, 0x19, 0x6a, 0x0b,
        0x32,
    ];

    // FIPS-197 Appendix C.1 key and input
    const FIPS_C_KEY: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f,
    ];
    const FIPS_C_PLAINTEXT: [u8; 16] = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
        0xff,
    ];
    const FIPS_C_CIPHERTEXT: [u8; 16] = [
        0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4, 0xc5,
        0x5a,
    ];

    fn reference_encrypt(key: &[u8; 16], block: &[u8; 16]) -> [u8; 16] {
        let cipher = aes::Aes128::new(&(*key).into());
        let mut out: aes::Block = (*block).into();
        cipher.encrypt_block(&mut out);
        out.into()
    }

    // xorshift32; deterministic byte stream for property-style tests
    fn fill_bytes(seed: &mut u32, buf: &mut [u8; 16]) {
        for b in buf.iter_mut() {
            *seed ^= *seed << 13;
            *seed ^= *seed >> 17;
            *seed ^= *seed << 5;
            *b = *seed as u8;
        }
    }

    #[test]
    fn test_encrypt_known_answer() {
        assert_eq!(encrypt_block(&FIPS_B_KEY, &FIPS_B_PLAINTEXT), FIPS_B_CIPHERTEXT);
        assert_eq!(encrypt_block(&FIPS_C_KEY, &FIPS_C_PLAINTEXT), FIPS_C_CIPHERTEXT);
    }

    #[test]
    fn test_decrypt_known_answer() {
        assert_eq!(decrypt_block(&FIPS_B_KEY, &FIPS_B_CIPHERTEXT), FIPS_B_PLAINTEXT);
        assert_eq!(decrypt_block(&FIPS_C_KEY, &FIPS_C_CIPHERTEXT), FIPS_C_PLAINTEXT);
    }

    #[test]
    fn test_encrypt_matches_reference_cipher() {
        let mut seed = 0x3243f6a8u32;
        let mut key = [0u8; 16];
        let mut block = [0u8; 16];
        for _ in 0..64 {
            fill_bytes(&mut seed, &mut key);
            fill_bytes(&mut seed, &mut block);
            assert_eq!(encrypt_block(&key, &block), reference_encrypt(&key, &block));
        }
    }

    #[test]
    fn test_round_trip() {
        let mut seed = 0x885a308du32;
        let mut key = [0u8; 16];
        let mut block = [0u8; 16];
        for _ in 0..64 {
            fill_bytes(&mut seed, &mut key);
            fill_bytes(&mut seed, &mut block);
            assert_eq!(decrypt_block(&key, &encrypt_block(&key, &block)), block);
        }
    }

    #[test]
    fn test_shift_rows() {
        let mut state: [u8; 16] = core::array::from_fn(|i| i as u8);
        shift_rows(&mut state);
        assert_eq!(
            state,
            [0, 5, 10, 15, 4, 9, 14, 3, 8, 13, 2, 7, 12, 1, 6, 11]
        );
        inv_shift_rows(&mut state);
        assert_eq!(state, core::array::from_fn(|i| i as u8));
    }

    #[test]
    fn test_transform_inverses() {
        let mut seed = 0xe0370734u32;
        let mut block = [0u8; 16];
        for _ in 0..16 {
            fill_bytes(&mut seed, &mut block);
            let original = block;

            sub_bytes(&mut block);
            inv_sub_bytes(&mut block);
            assert_eq!(block, original);

            mix_columns(&mut block);
            inv_mix_columns(&mut block);
            assert_eq!(block, original);

            shift_rows(&mut block);
            inv_shift_rows(&mut block);
            assert_eq!(block, original);
        }
    }

    #[test]
    fn test_final_round_skips_mix_columns() {
        let mut aes = Aes128::new(AesOp::Encrypt, &FIPS_C_KEY);
        aes.load_block(&FIPS_C_PLAINTEXT);
        for round in 1..AES_128_ROUNDS {
            aes.round(round);
        }
        // Compose the last round by hand, without MixColumns; it must land
        // exactly on the cipher output.
        let mut state = *aes.block();
        sub_bytes(&mut state);
        shift_rows(&mut state);
        let schedule = KeySchedule::expand(&FIPS_C_KEY);
        add_round_key(&mut state, schedule.round_key(AES_128_ROUNDS));

        aes.round(AES_128_ROUNDS);
        assert_eq!(aes.block(), &state);
        assert_eq!(aes.block(), &FIPS_C_CIPHERTEXT);
    }

    #[test]
    fn test_stepped_matches_one_shot() {
        let mut aes = Aes128::new(AesOp::Decrypt, &FIPS_B_KEY);
        aes.load_block(&FIPS_B_CIPHERTEXT);
        for round in 1..=AES_128_ROUNDS {
            aes.round(round);
        }
        assert_eq!(aes.block(), &FIPS_B_PLAINTEXT);
    }
}
