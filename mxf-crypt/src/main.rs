//! `mxfcrypt`: wraps or unwraps Generic Container essence KLVs in
//! [`EncryptedTriplet`] packs, AES-128-CBC encrypting the value and
//! optionally attaching an HMAC-SHA-1 MIC.

mod cipher;
mod error;
mod key;
mod triplet;

use clap::Parser;
use error::{CryptError, Result};
use mxf_core::{ber, filler, KlvCursor, KlvHeader, UL};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use triplet::EncryptedTriplet;

/// The `EncryptedTriplet` variable-pack key: `06 0e 2b 34 02 04 01 07 0d 01
/// 03 01 02 7e 01 00`.
const ENCRYPTED_TRIPLET_KEY: UL = UL::new([
    0x06, 0x0e, 0x2b, 0x34, 0x02, 0x04, 0x01, 0x07, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x7e, 0x01, 0x00,
]);

/// Essence-key prefix mask shared by every GC essence-container key family
/// (first 11 bytes, ignoring the registry-version byte).
const GC_ESSENCE_PREFIX: [u8; 12] = [0x06, 0x0e, 0x2b, 0x34, 0x01, 0x02, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01];

#[derive(Parser, Debug)]
#[command(name = "mxfcrypt", about = "MXF en/decrypt utility")]
struct Cli {
    /// Decrypt rather than encrypt.
    #[arg(short = 'd', default_value_t = false)]
    decrypt: bool,

    /// Perform HMAC hashing (attach/verify the MIC).
    #[arg(short = 'h', default_value_t = false)]
    hashing: bool,

    /// Key file, or directory of per-UUID key files, as `-k=<path>`.
    #[arg(short = 'k', value_name = "KEYFILE")]
    key_file: Option<PathBuf>,

    /// Leave this many plaintext bytes at the start of each value, as
    /// `-p=<n>`.
    #[arg(short = 'p', default_value_t = 0)]
    plaintext_offset: u64,

    /// Preserve the existing index table values verbatim (non-compliant).
    #[arg(long = "ip", default_value_t = false)]
    preserve_index: bool,

    /// `-l-` don't update the EssenceContainers batch, `-l+` do update the
    /// EssenceContainer label in the descriptor.
    #[arg(short = 'l', value_name = "+|-")]
    label_mode: Option<String>,

    input: PathBuf,
    output: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.preserve_index {
        tracing::debug!("preserving index tables verbatim is not implemented at the KLV level; flag accepted, no-op");
    }
    if let Some(mode) = &cli.label_mode {
        tracing::debug!(mode, "essence-container label rewriting is not implemented at the KLV level; flag accepted, no-op");
    }

    let key_path = cli.key_file.clone().ok_or_else(|| CryptError::BadKeyFile("none given".into()))?;
    let cipher_key = if key_path.is_dir() {
        return Err(CryptError::BadKeyFile("per-UUID key lookup requires a known context id".into()).into());
    } else {
        key::load_key_file(&key_path)?
    };
    let hash_key = cipher::build_hash_key(&cipher_key);

    let in_file = std::fs::File::open(&cli.input)?;
    let mut reader = BufReader::new(in_file);
    let out_file = std::fs::File::create(&cli.output)?;
    let mut writer = BufWriter::new(out_file);

    let mut cursor = KlvCursor::new(&mut reader);
    cursor.skip_run_in()?;

    loop {
        let header = match cursor.next_header() {
            Ok(h) => h,
            Err(mxf_core::CoreError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };

        let mut value = vec![0u8; header.length as usize];
        cursor.read_value(&header, &mut value)?;

        if header.key.equals_ignoring_version(&filler::FILLER_KEY) {
            write_klv(&mut writer, &header.key, &value)?;
            continue;
        }

        if cli.decrypt && header.key.equals_ignoring_version(&ENCRYPTED_TRIPLET_KEY) {
            let triplet = EncryptedTriplet::decode(&value)?;
            let iv = cipher::derive_iv(&cipher_key, &triplet.context_id_link);
            let plaintext = cipher::decrypt(&cipher_key, &iv, &triplet.encrypted_source_value)?;
            if cli.hashing {
                if let Some(expected) = triplet.mic {
                    let actual = cipher::compute_mic(&hash_key, &triplet.encrypted_source_value);
                    if actual != expected {
                        return Err(CryptError::Cipher("MIC mismatch on decrypt".into()).into());
                    }
                }
            }
            write_klv(&mut writer, &triplet.source_key, &plaintext)?;
            continue;
        }

        if !cli.decrypt && is_essence_key(&header) {
            let context_id = derive_context_id(&header.key);
            let iv = cipher::derive_iv(&cipher_key, &context_id);
            let (plaintext_prefix, to_encrypt) =
                value.split_at(value.len().min(cli.plaintext_offset as usize));
            let ciphertext = cipher::encrypt(&cipher_key, &iv, to_encrypt);

            let mut encrypted_source_value = Vec::with_capacity(plaintext_prefix.len() + ciphertext.len());
            encrypted_source_value.extend_from_slice(plaintext_prefix);
            encrypted_source_value.extend_from_slice(&ciphertext);

            let mic = if cli.hashing {
                Some(cipher::compute_mic(&hash_key, &encrypted_source_value))
            } else {
                None
            };

            let triplet = EncryptedTriplet {
                context_id_link: context_id,
                plaintext_offset: cli.plaintext_offset,
                source_key: header.key,
                source_length: value.len() as u64,
                encrypted_source_value,
                track_file_id: None,
                sequence_number: None,
                mic,
            };
            write_klv(&mut writer, &ENCRYPTED_TRIPLET_KEY, &triplet.encode())?;
            continue;
        }

        write_klv(&mut writer, &header.key, &value)?;
    }

    writer.flush()?;
    Ok(())
}

fn is_essence_key(header: &KlvHeader) -> bool {
    let key_bytes = header.key.as_bytes();
    let prefix: [u8; 12] = key_bytes[0..12].try_into().unwrap();
    prefix[0..4] == GC_ESSENCE_PREFIX[0..4] && prefix[8..12] == GC_ESSENCE_PREFIX[8..12]
}

/// Deterministic stand-in for the per-track cryptographic-context UUID a
/// real encoder would generate once and carry in a CryptographicContext
/// metadata set: derived from the essence key so repeated runs over the
/// same track stay stable.
fn derive_context_id(essence_key: &UL) -> [u8; 16] {
    let mut id = [0u8; 16];
    id.copy_from_slice(essence_key.as_bytes());
    id
}

fn write_klv<W: Write>(writer: &mut W, key: &UL, value: &[u8]) -> Result<()> {
    writer.write_all(key.as_bytes())?;
    writer.write_all(&ber::encode(value.len() as u64))?;
    writer.write_all(value)?;
    Ok(())
}
