#![allow(dead_code)]

use agnes::cart::{CartridgeImage, HEADER_LEN, PRG_BANK_SIZE, CHR_BANK_SIZE};

pub const MMC1_FLAGS6: u8 = 0x10;

pub fn header(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> [u8; HEADER_LEN] {
    let mut header = [0; HEADER_LEN];
    header[..4].copy_from_slice(b"NES\x1A");
    header[4] = prg_banks;
    header[5] = chr_banks;
    header[6] = flags6;
    header[7] = flags7;
    header
}

/// Header followed by `prg` and `chr_banks` zeroed CHR banks.
pub fn image_bytes(header: [u8; HEADER_LEN], prg: &[u8], chr_banks: usize) -> Vec<u8> {
    let mut bytes = header.to_vec();
    bytes.extend_from_slice(prg);
    bytes.resize(bytes.len() + chr_banks * CHR_BANK_SIZE, 0);
    bytes
}

/// PRG ROM where every byte of bank `n` is `n`.
pub fn banked_prg(banks: usize) -> Vec<u8> {
    (0..banks)
        .flat_map(|bank| std::iter::repeat(bank as u8).take(PRG_BANK_SIZE))
        .collect()
}

/// An MMC1 image whose PRG banks are filled by `banked_prg`.
pub fn mmc1_image(prg_banks: u8, flags6: u8) -> CartridgeImage {
    let prg = banked_prg(prg_banks as usize);
    let bytes = image_bytes(header(prg_banks, 1, MMC1_FLAGS6 | flags6, 0), &prg, 1);
    CartridgeImage::from_bytes(bytes).expect("valid test image")
}

/// An MMC1 image with `program` in the last PRG bank at `$C000` and the reset vector pointing at it.
pub fn mmc1_program_image(prg_banks: u8, program: &[u8]) -> CartridgeImage {
    let mut prg = banked_prg(prg_banks as usize);
    let last_bank = (prg_banks as usize - 1) * PRG_BANK_SIZE;
    prg[last_bank..last_bank + program.len()].copy_from_slice(program);
    let vector = last_bank + 0x3FFC;
    prg[vector..vector + 2].copy_from_slice(&0xC000u16.to_le_bytes());
    let bytes = image_bytes(header(prg_banks, 1, MMC1_FLAGS6, 0), &prg, 1);
    CartridgeImage::from_bytes(bytes).expect("valid test image")
}
