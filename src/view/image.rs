use std::fs::File;
use std::io;
use std::path::Path;

use memmap::{Mmap, MmapOptions};

use crate::view::artifact::{check_range, Artifact};

/// Provide backing storage (file or memory) for an artifact.  Images are
/// read-only: decoding never modifies the medium it is decoding.
pub enum Image {
    Map(Mmap),
    Memory(Box<[u8]>),
}

impl Image {
    /// Map an image file into memory.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Image> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            // Zero-length files cannot be mapped.
            return Ok(Image::Memory(Box::new([])));
        }
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        Ok(Image::Map(mmap))
    }

    /// Use an in-memory buffer as the image.
    pub fn from_bytes(bytes: Vec<u8>) -> Image {
        Image::Memory(bytes.into_boxed_slice())
    }

    fn as_slice(&self) -> &[u8] {
        match self {
            Image::Map(mmap) => &mmap[..],
            Image::Memory(array) => array,
        }
    }
}

impl Artifact for Image {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn bytes(&self, lo: usize, hi: usize) -> io::Result<&[u8]> {
        check_range(lo, hi, self.len())?;
        Ok(&self.as_slice()[lo..hi])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_memory_image() {
        let image = Image::from_bytes(vec![0xe5; 128]);
        assert_eq!(image.len(), 128);
        assert_eq!(image.bytes(126, 128).unwrap(), &[0xe5, 0xe5]);
        assert!(image.bytes(127, 129).is_err());
    }

    #[test]
    fn test_mapped_image() {
        let path = std::env::temp_dir().join(format!("octetview-image-{}.img", std::process::id()));
        {
            let mut file = File::create(&path).unwrap();
            file.write_all(b"\x01\x02\x03\x04").unwrap();
        }
        let image = Image::open(&path).unwrap();
        assert_eq!(image.len(), 4);
        assert_eq!(image.byte(2).unwrap(), 3);
        drop(image);

        File::create(&path).unwrap();
        let image = Image::open(&path).unwrap();
        assert!(image.is_empty());
        drop(image);
        std::fs::remove_file(&path).unwrap();
    }
}
