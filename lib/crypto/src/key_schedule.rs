/*++

Licensed under the Apache-2.0 license.

File Name:

    key_schedule.rs

Abstract:

    File contains the AES-128 key expansion unit.

--*/

use crate::sbox::sub_byte;

/// Number of round keys produced by AES-128 key expansion
pub const ROUND_KEY_COUNT: usize = 11;

/// Expanded AES-128 round key schedule.
///
/// Round key 0 is the cipher key itself; round keys 1..=10 are derived by the
/// word recurrence of FIPS-197 §5.2. The schedule is a pure function of the
/// key and is produced fresh for every operation.
pub struct KeySchedule {
    round_keys: [[u8; 16]; ROUND_KEY_COUNT],
}

impl KeySchedule {
    /// Expand a 128-bit cipher key into the full 11-entry schedule.
    pub fn expand(key: &[u8; 16]) -> Self {
        let mut words = [[0u8; 4]; 4 * ROUND_KEY_COUNT];
        for (i, word) in words.iter_mut().take(4).enumerate() {
            word.copy_from_slice(&key[4 * i..4 * i + 4]);
        }

        let mut rcon: u8 = 0x01;
        for i in 4..4 * ROUND_KEY_COUNT {
            let mut temp = words[i - 1];
            if i % 4 == 0 {
                temp = Self::sub_word(Self::rot_word(temp));
                temp[0] ^= rcon;
                // double the round constant in GF(2^8)
                let carry = rcon & 0x80 != 0;
                rcon <<= 1;
                if carry {
                    rcon ^= 0x1B;
                }
            }
            for j in 0..4 {
                words[i][j] = words[i - 4][j] ^ temp[j];
            }
        }

        let mut round_keys = [[0u8; 16]; ROUND_KEY_COUNT];
        for (r, round_key) in round_keys.iter_mut().enumerate() {
            for w in 0..4 {
                round_key[4 * w..4 * w + 4].copy_from_slice(&words[4 * r + w]);
            }
        }
        Self { round_keys }
    }

    /// Round key for the given round, 0..=10.
    pub fn round_key(&self, round: usize) -> &[u8; 16] {
        &self.round_keys[round]
    }

    /// Rotate a 4-byte word left by one byte
    fn rot_word(word: [u8; 4]) -> [u8; 4] {
        [word[1], word[2], word[3], word[0]]
    }

    /// Apply the forward S-box to each byte of a word
    fn sub_word(word: [u8; 4]) -> [u8; 4] {
        [
            sub_byte(word[0]),
            sub_byte(word[1]),
            sub_byte(word[2]),
            sub_byte(word[3]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // FIPS-197 Appendix A.1 example key
    const KEY: [u8; 16] = [
        0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f,
        0x3c,
    ];

    #[test]
    fn test_round_key_0_is_cipher_key() {
        let schedule = KeySchedule::expand(&KEY);
        assert_eq!(schedule.round_key(0), &KEY);
    }

    #[test]
    fn test_expansion_vectors() {
        let schedule = KeySchedule::expand(&KEY);

        let expected_rk1: [u8; 16] = [
            0xa0, 0xfa, 0xfe, 0x17, 0x88, 0x54, 0x2c, 0xb1, 0x23, 0xa3, 0x39, 0x39, 0x2a, 0x6c,
            0x76, 0x05,
        ];
        assert_eq!(schedule.round_key(1), &expected_rk1);

        let expected_rk10: [u8; 16] = [
            0xd0, 0x14, 0xf9, 0xa8, 0xc9, 0xee, 0x25, 0x89, 0xe1, 0x3f, 0x0c, 0xc8, 0xb6, 0x63,
            0x0c, 0xa6,
        ];
        assert_eq!(schedule.round_key(10), &expected_rk10);
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let a = KeySchedule::expand(&KEY);
        let b = KeySchedule::expand(&KEY);
        for round in 0..ROUND_KEY_COUNT {
            assert_eq!(a.round_key(round), b.round_key(round));
        }
    }
}
