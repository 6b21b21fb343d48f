use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use zstd::{Decoder, Encoder};

pub fn create_file_buf_write<P: AsRef<Path>>(path: P) -> io::Result<BufWriter<File>> {
    let file = File::create(path)?;
    Ok(BufWriter::new(file))
}

pub fn open_file_buf_read<P: AsRef<Path>>(path: P) -> io::Result<BufReader<File>> {
    let file = File::open(path)?;
    Ok(BufReader::new(file))
}

// directly copied from [https://doc.rust-lang.org/std/io/trait.BufRead.html#method.has_data_left]
// unfortunately, that method isn't stable yet
pub fn has_data_left<R: BufRead>(mut reader: R) -> io::Result<bool> {
    reader.fill_buf().map(|b| !b.is_empty())
}

/// Writes `value` as zstd-compressed bincode. The compressed frame is
/// finished and flushed before returning, so a successful return means the
/// whole value reached `writer`.
pub fn serialize_compressed_into<W, T>(writer: W, value: &T) -> bincode::Result<()>
where
    W: Write,
    T: ?Sized + Serialize,
{
    let mut encoder = Encoder::new(writer, 0)?;
    bincode::serialize_into(&mut encoder, value)?;
    encoder.finish()?.flush()?;
    Ok(())
}

/// Inverse of [`serialize_compressed_into`]. Trailing data after the value
/// is rejected.
pub fn deserialize_compressed_from<R, T>(reader: R) -> bincode::Result<T>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut reader = BufReader::new(Decoder::new(reader)?);
    let value = bincode::deserialize_from(&mut reader)?;
    if has_data_left(&mut reader)? {
        return Err(Box::new(bincode::ErrorKind::Custom(
            "deserialization of compressed data didn't reach EOF".to_string(),
        )));
    }
    Ok(value)
}

pub fn save_compressed<P, T>(path: P, value: &T) -> bincode::Result<()>
where
    P: AsRef<Path>,
    T: ?Sized + Serialize,
{
    let file = create_file_buf_write(path)?;
    serialize_compressed_into(file, value)
}

pub fn load_compressed<P, T>(path: P) -> bincode::Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let file = open_file_buf_read(path)?;
    deserialize_compressed_from(file)
}
