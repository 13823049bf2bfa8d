/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the AES Engine Emulator Peripheral library.

--*/

mod aes128_engine;

pub use aes128_engine::AesEngine;
