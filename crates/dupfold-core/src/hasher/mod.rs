use std::fs::File;
use std::hash::Hasher as _;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use twox_hash::XxHash64;

/// Size of each sampled region for large files.
const SAMPLE_SIZE: usize = 16 * 1024;
/// Files at or below this size are hashed in full.
const SAMPLE_THRESHOLD: u64 = 128 * 1024;

/// Partial-content fingerprint suitable for fast dedup at scale.
///
/// Small files are hashed whole; larger files contribute three fixed-size
/// samples (head, middle, tail) via XxHash64. The file size is embedded in
/// the output string, so files of different sizes can never compare equal.
/// Not a cryptographic digest: callers accept the (tiny) false-positive
/// risk and treat the fingerprint as the sole equality predicate.
pub fn fingerprint_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    fingerprint_reader(&mut file, size)
}

/// Fingerprint an open reader of known length.
pub fn fingerprint_reader<R: Read + Seek>(reader: &mut R, size: u64) -> io::Result<String> {
    let mut hasher = XxHash64::with_seed(0);

    if size <= SAMPLE_THRESHOLD {
        let mut buffer = Vec::with_capacity(size as usize);
        reader.read_to_end(&mut buffer)?;
        hasher.write(&buffer);
    } else {
        let mut buffer = vec![0u8; SAMPLE_SIZE];

        reader.seek(SeekFrom::Start(0))?;
        read_sample(reader, &mut buffer, &mut hasher)?;

        reader.seek(SeekFrom::Start(size / 2 - (SAMPLE_SIZE as u64) / 2))?;
        read_sample(reader, &mut buffer, &mut hasher)?;

        reader.seek(SeekFrom::End(-(SAMPLE_SIZE as i64)))?;
        read_sample(reader, &mut buffer, &mut hasher)?;
    }

    Ok(format!("{:x}-{:016x}", size, hasher.finish()))
}

/// Fingerprint an in-memory buffer. Matches [`fingerprint_reader`] for the
/// same bytes.
pub fn fingerprint_bytes(data: &[u8]) -> String {
    let mut cursor = io::Cursor::new(data);
    // Cursor reads cannot fail.
    fingerprint_reader(&mut cursor, data.len() as u64).expect("in-memory fingerprint")
}

fn read_sample<R: Read>(
    reader: &mut R,
    buffer: &mut [u8],
    hasher: &mut XxHash64,
) -> io::Result<()> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = reader.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    hasher.write(&buffer[..filled]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_bytes_equal_fingerprint() {
        let a = fingerprint_bytes(b"the same content");
        let b = fingerprint_bytes(b"the same content");
        assert_eq!(a, b);
    }

    #[test]
    fn different_sizes_never_collide() {
        let small = fingerprint_bytes(&[0u8; 100]);
        let large = fingerprint_bytes(&[0u8; 200]);
        assert_ne!(small, large);
        assert!(small.starts_with("64-"));
        assert!(large.starts_with("c8-"));
    }

    #[test]
    fn large_files_use_samples() {
        // Two buffers over the sampling threshold differing only in a
        // sampled region must produce different fingerprints.
        let mut a = vec![0u8; (SAMPLE_THRESHOLD as usize) * 2];
        let b = a.clone();
        a[0] = 1; // head sample
        assert_ne!(fingerprint_bytes(&a), fingerprint_bytes(&b));

        let mut c = b.clone();
        let last = c.len() - 1;
        c[last] = 1; // tail sample
        assert_ne!(fingerprint_bytes(&c), fingerprint_bytes(&b));
    }
}
