//! GF(256) Reed-Solomon codec.
//!
//! Ported from the classical Phil Karn `fec` library structure used by the
//! original IL2P implementation (`fec.h`/`fec_init.c`/`fec_encode.c`):
//! symbol size 8 (`mm`), codeword length 255 (`nn`), primitive polynomial
//! 0x11d, primitive element 1, first consecutive root 0. IL2P fixes five
//! parity-symbol counts (2, 4, 6, 8, 16); `RsCodec::for_parity` returns a
//! process-lifetime-cached codec for each, mirroring `il2p_init`'s
//! `Tab[NTAB]` of pre-built `struct rs` control blocks.

use std::sync::OnceLock;

use crate::errors::FecError;

/// Symbol count of a full GF(256) codeword.
pub const BLOCK_SIZE: usize = 255;
const SYMBOL_BITS: u32 = 8;
const FIELD_SIZE: usize = 256; // 2^SYMBOL_BITS
const GF_POLY: u32 = 0x11d;
const PRIM: usize = 1;
const FCR: usize = 0; // first consecutive root

/// A GF(256) Reed-Solomon codec for a fixed number of parity symbols.
///
/// `alpha_to[i]` is the field element for exponent `i`; `index_of[e]` is
/// the exponent of field element `e` (`index_of[0]` is unused, the
/// original's `A0` sentinel). `genpoly` holds the generator polynomial
/// coefficients in index (log) form, per `init_rs_char`.
#[derive(Debug)]
pub struct RsCodec {
    alpha_to: [u8; FIELD_SIZE],
    index_of: [u8; FIELD_SIZE],
    genpoly: Vec<u8>,
    nroots: usize,
}

const A0: u8 = (FIELD_SIZE - 1) as u8; // index_of sentinel for zero element

impl RsCodec {
    fn new(nroots: usize) -> Self {
        let mut alpha_to = [0u8; FIELD_SIZE];
        let mut index_of = [0u8; FIELD_SIZE];

        // Build log/antilog tables via the LFSR recurrence in fec_init.c.
        let mut sr: u32 = 1;
        for i in 0..(FIELD_SIZE - 1) {
            alpha_to[i] = sr as u8;
            index_of[sr as usize] = i as u8;
            sr <<= 1;
            if sr & FIELD_SIZE as u32 != 0 {
                sr ^= GF_POLY;
            }
            sr &= (FIELD_SIZE - 1) as u32;
        }
        index_of[0] = A0;
        alpha_to[FIELD_SIZE - 1] = 0;

        // Generator polynomial: product over roots fcr*prim .. for nroots terms.
        let mut genpoly = vec![0u8; nroots + 1];
        genpoly[0] = 1;
        for i in 0..nroots {
            genpoly[i + 1] = 1;
            let root_exp = (FCR + i) * PRIM;
            for j in (1..=i + 1).rev() {
                if genpoly[j] != 0 {
                    let idx = index_of[genpoly[j] as usize] as usize;
                    genpoly[j] = genpoly[j - 1]
                        ^ alpha_to[modnn(idx + root_exp)];
                } else {
                    genpoly[j] = genpoly[j - 1];
                }
            }
            genpoly[0] = alpha_to[modnn(index_of[genpoly[0] as usize] as usize + root_exp)];
        }
        // Store in index form as the original does, for faster encoding.
        let genpoly: Vec<u8> = genpoly
            .into_iter()
            .map(|c| index_of[c as usize])
            .collect();

        Self {
            alpha_to,
            index_of,
            genpoly,
            nroots,
        }
    }

    /// Number of parity symbols this codec produces/consumes.
    pub fn nroots(&self) -> usize {
        self.nroots
    }

    /// Encode `data` (at most `BLOCK_SIZE - nroots` symbols) producing
    /// exactly `nroots` parity symbols. Short data is implicitly
    /// zero-padded at the front of the conceptual codeword, matching
    /// `encode_rs_char`'s shift-register convolution.
    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        let mut parity = vec![0u8; self.nroots];
        let pad = BLOCK_SIZE - self.nroots - data.len();
        for i in 0..data.len() + pad {
            let data_byte = if i < pad { 0 } else { data[i - pad] };
            let feedback = self.index_of[(data_byte ^ parity[0]) as usize];
            if feedback != A0 {
                for j in 1..self.nroots {
                    parity[j] ^= self.alpha_to
                        [modnn(feedback as usize + self.genpoly[self.nroots - j] as usize)];
                }
            }
            parity.copy_within(1.., 0);
            if feedback != A0 {
                parity[self.nroots - 1] =
                    self.alpha_to[modnn(feedback as usize + self.genpoly[0] as usize)];
            } else {
                parity[self.nroots - 1] = 0;
            }
        }
        parity
    }

    /// Decode a received block of `data.len() + nroots` symbols in place
    /// (data followed by parity). Returns the number of corrected symbols,
    /// or `FecError::Uncorrectable` / `FecError::PaddingCorruption`.
    ///
    /// `pad` is the number of implicit leading zero symbols that were not
    /// actually transmitted (`il2p_decode_rs`'s zero-padding trick so
    /// short IL2P blocks still use the fixed GF(256) codec).
    pub fn decode(&self, data: &mut [u8], parity: &mut [u8], pad: usize) -> Result<usize, FecError> {
        assert_eq!(parity.len(), self.nroots);
        let n = data.len() + parity.len();
        if n + pad > BLOCK_SIZE {
            return Err(FecError::BlockTooLarge {
                total: n + pad,
                block_size: BLOCK_SIZE,
            });
        }

        // Assemble the full codeword (zero-padded) for syndrome computation.
        let mut codeword = vec![0u8; BLOCK_SIZE];
        codeword[BLOCK_SIZE - n..BLOCK_SIZE - parity.len()].copy_from_slice(data);
        codeword[BLOCK_SIZE - parity.len()..].copy_from_slice(parity);

        let (corrected_count, locations) = self.correct_errors(&mut codeword)?;

        for &loc in &locations {
            // Any correction inside the implicit zero-padding region
            // indicates the decoder "fixed" a padding byte that was
            // never really zero -- treat as uncorrectable.
            if loc < pad {
                return Err(FecError::PaddingCorruption);
            }
        }

        data.copy_from_slice(&codeword[BLOCK_SIZE - n..BLOCK_SIZE - parity.len()]);
        parity.copy_from_slice(&codeword[BLOCK_SIZE - parity.len()..]);

        Ok(corrected_count)
    }

    /// PGZ / Berlekamp-Massey / Chien / Forney error correction over a
    /// full `BLOCK_SIZE`-symbol codeword, in place. Returns the number of
    /// corrected symbols and their positions (index from the start of
    /// `codeword`).
    fn correct_errors(&self, codeword: &mut [u8]) -> Result<(usize, Vec<usize>), FecError> {
        debug_assert_eq!(codeword.len(), BLOCK_SIZE);

        // 1. Syndromes.
        let mut syndromes = vec![0u8; self.nroots];
        let mut has_error = false;
        for (i, syn) in syndromes.iter_mut().enumerate() {
            let mut acc = codeword[0];
            for &sym in &codeword[1..] {
                acc = if acc == 0 {
                    sym
                } else {
                    sym ^ self.alpha_to[modnn(self.index_of[acc as usize] as usize + FCR + i * PRIM)]
                };
            }
            *syn = acc;
            if acc != 0 {
                has_error = true;
            }
        }
        if !has_error {
            return Ok((0, Vec::new()));
        }

        // 2. Berlekamp-Massey for the error-locator polynomial Lambda(x).
        let mut lambda = vec![0u8; self.nroots + 1];
        lambda[0] = 1;
        let mut b = vec![0u8; self.nroots + 1];
        b[0] = 1;
        let mut l = 0usize;
        let mut m = 1usize;
        let mut bb = 1u8;

        for n in 0..self.nroots {
            let mut discrepancy = syndromes[n];
            for i in 1..=l {
                if lambda[i] != 0 && syndromes[n - i] != 0 {
                    discrepancy ^= self.alpha_to[modnn(
                        self.index_of[lambda[i] as usize] as usize
                            + self.index_of[syndromes[n - i] as usize] as usize,
                    )];
                }
            }
            if discrepancy == 0 {
                m += 1;
            } else {
                let t = lambda.clone();
                let coef = self.alpha_to[modnn(
                    self.index_of[discrepancy as usize] as usize
                        + (FIELD_SIZE - 1)
                        - self.index_of[bb as usize] as usize,
                )];
                for i in 0..=self.nroots {
                    if i >= m && b[i - m] != 0 {
                        lambda[i] ^= self.alpha_to[modnn(
                            self.index_of[coef as usize] as usize
                                + self.index_of[b[i - m] as usize] as usize,
                        )];
                    }
                }
                if 2 * l <= n {
                    l = n + 1 - l;
                    b = t;
                    bb = discrepancy;
                    m = 1;
                } else {
                    m += 1;
                }
            }
        }

        if l > self.nroots / 2 {
            return Err(FecError::Uncorrectable);
        }

        // 3. Chien search: roots of Lambda(x) are the error locator inverses.
        let mut error_locations = Vec::new();
        for i in 0..BLOCK_SIZE {
            let mut sum = 0u8;
            for (j, &lj) in lambda.iter().enumerate().take(l + 1) {
                if lj != 0 {
                    sum ^= self.alpha_to
                        [modnn(self.index_of[lj as usize] as usize + j * (i + 1))];
                }
            }
            if sum == 0 {
                error_locations.push(BLOCK_SIZE - 1 - i);
            }
        }
        if error_locations.len() != l {
            return Err(FecError::Uncorrectable);
        }

        // 4. Forney's formula for error magnitudes.
        // Omega(x) = Syndrome(x) * Lambda(x) mod x^nroots
        let mut omega = vec![0u8; self.nroots];
        for i in 0..self.nroots {
            let mut acc = 0u8;
            for j in 0..=i.min(l) {
                if lambda[j] != 0 && syndromes[i - j] != 0 {
                    acc ^= self.alpha_to[modnn(
                        self.index_of[lambda[j] as usize] as usize
                            + self.index_of[syndromes[i - j] as usize] as usize,
                    )];
                }
            }
            omega[i] = acc;
        }

        for &loc in &error_locations {
            let xi_inv_exp = BLOCK_SIZE - 1 - loc; // exponent of X_i^-1 = alpha^(loc_complement)
            let mut omega_val = 0u8;
            for (j, &oj) in omega.iter().enumerate() {
                if oj != 0 {
                    omega_val ^= self.alpha_to[modnn(self.index_of[oj as usize] as usize + j * xi_inv_exp)];
                }
            }
            let mut lambda_deriv = 0u8;
            let mut j = 1;
            while j <= l {
                if lambda[j] != 0 {
                    lambda_deriv ^= self.alpha_to
                        [modnn(self.index_of[lambda[j] as usize] as usize + (j - 1) * xi_inv_exp)];
                }
                j += 2;
            }
            if lambda_deriv == 0 || omega_val == 0 {
                continue;
            }
            let magnitude = self.alpha_to[modnn(
                self.index_of[omega_val as usize] as usize + (FIELD_SIZE - 1)
                    - self.index_of[lambda_deriv as usize] as usize,
            )];
            codeword[BLOCK_SIZE - 1 - loc] ^= magnitude;
        }

        Ok((error_locations.len(), error_locations))
    }
}

fn modnn(mut x: usize) -> usize {
    while x >= FIELD_SIZE - 1 {
        x -= FIELD_SIZE - 1;
        x = (x >> SYMBOL_BITS) + (x & (FIELD_SIZE - 1));
    }
    x
}

struct RsTable {
    codecs: [OnceLock<RsCodec>; 5],
}

// Parity counts the IL2P tables fix (`il2p_init.c`'s `Tab[NTAB]`).
const PARITY_COUNTS: [usize; 5] = [2, 4, 6, 8, 16];

static TABLE: RsTable = RsTable {
    codecs: [
        OnceLock::new(),
        OnceLock::new(),
        OnceLock::new(),
        OnceLock::new(),
        OnceLock::new(),
    ],
};

impl RsCodec {
    /// Look up the process-lifetime codec for the given parity count.
    /// Falls back to the 2-parity codec for an unrecognized count, same
    /// as `il2p_find_rs`'s `Tab[0]` default.
    pub fn for_parity(nparity: usize) -> &'static RsCodec {
        let idx = PARITY_COUNTS
            .iter()
            .position(|&p| p == nparity)
            .unwrap_or(0);
        TABLE.codecs[idx].get_or_init(|| RsCodec::new(PARITY_COUNTS[idx]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn encode_decode_roundtrip_no_errors() {
        let codec = RsCodec::for_parity(16);
        let data = b"hello il2p block payload data!!".to_vec();
        let parity = codec.encode(&data);

        let mut data_mut = data.clone();
        let mut parity_mut = parity.clone();
        let pad = BLOCK_SIZE - data.len() - parity.len();
        let corrected = codec.decode(&mut data_mut, &mut parity_mut, pad).unwrap();
        assert_eq!(corrected, 0);
        assert_eq!(data_mut, data);
    }

    #[test]
    fn corrects_up_to_half_parity_errors() {
        let codec = RsCodec::for_parity(16);
        let data = vec![0xA5u8; 40];
        let parity = codec.encode(&data);
        let pad = BLOCK_SIZE - data.len() - parity.len();

        let mut rng = StdRng::seed_from_u64(7);
        let mut corrupted = data.clone();
        let max_errors = codec.nroots() / 2;
        let mut flipped = std::collections::HashSet::new();
        while flipped.len() < max_errors {
            flipped.insert(rng.gen_range(0..corrupted.len()));
        }
        for &idx in &flipped {
            corrupted[idx] ^= 0xFF;
        }

        let mut parity_mut = parity.clone();
        let corrected = codec.decode(&mut corrupted, &mut parity_mut, pad).unwrap();
        assert_eq!(corrected, max_errors);
        assert_eq!(corrupted, data);
    }

    #[test]
    fn too_many_errors_reported_uncorrectable() {
        let codec = RsCodec::for_parity(16);
        let data = vec![0x3Cu8; 40];
        let parity = codec.encode(&data);
        let pad = BLOCK_SIZE - data.len() - parity.len();

        let mut corrupted = data.clone();
        for i in 0..(codec.nroots() / 2 + 2) {
            corrupted[i] ^= 0xFF;
        }
        let mut parity_mut = parity.clone();
        let result = codec.decode(&mut corrupted, &mut parity_mut, pad);
        assert!(result.is_err());
    }

    #[test]
    fn unsupported_parity_falls_back_to_two() {
        let codec = RsCodec::for_parity(3);
        assert_eq!(codec.nroots(), 2);
    }
}
