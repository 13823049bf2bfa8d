/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the AES Engine Emulator Crypto library.

--*/

mod aes128;
mod key_schedule;
mod sbox;

pub use aes128::{
    add_round_key, decrypt_block, encrypt_block, inv_mix_columns, inv_shift_rows, inv_sub_bytes,
    mix_columns, shift_rows, sub_bytes, Aes128, AesOp, AES_128_BLOCK_SIZE, AES_128_KEY_SIZE,
    AES_128_ROUNDS,
};
pub use key_schedule::{KeySchedule, ROUND_KEY_COUNT};
pub use sbox::{gf_mul, inv_sub_byte, sub_byte};
