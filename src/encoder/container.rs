use ogg::writing::{PacketWriteEndInfo, PacketWriter};
use rand::Rng;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::CHANNELS;

/// One Ogg logical stream being written to a file.
///
/// The two header packets (`OpusHead`, `OpusTags`) each close their page, as
/// the Ogg/Opus mapping requires; audio packets carry absolute granule
/// positions on the 48kHz clock.
pub struct OggStreamWriter {
    writer: PacketWriter<'static, BufWriter<File>>,
    serial: u32,
}

impl OggStreamWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: PacketWriter::new(BufWriter::new(file)),
            serial: rand::thread_rng().gen(),
        })
    }

    /// Opus identification header: version 1, mono, channel mapping family 0.
    pub fn write_id_header(&mut self, pre_skip: u16, input_sample_rate: u32) -> io::Result<()> {
        let mut head = Vec::with_capacity(19);
        head.extend_from_slice(b"OpusHead");
        head.push(1); // version
        head.push(CHANNELS);
        head.extend_from_slice(&pre_skip.to_le_bytes());
        head.extend_from_slice(&input_sample_rate.to_le_bytes());
        head.extend_from_slice(&0i16.to_le_bytes()); // output gain
        head.push(0); // channel mapping family

        self.writer
            .write_packet(head, self.serial, PacketWriteEndInfo::EndPage, 0)
    }

    /// Opus comment header carrying the vendor string and no user tags.
    pub fn write_comment_header(&mut self) -> io::Result<()> {
        let vendor = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));
        let mut tags = Vec::with_capacity(16 + vendor.len());
        tags.extend_from_slice(b"OpusTags");
        tags.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        tags.extend_from_slice(vendor.as_bytes());
        tags.extend_from_slice(&0u32.to_le_bytes()); // no user comments

        self.writer
            .write_packet(tags, self.serial, PacketWriteEndInfo::EndPage, 0)
    }

    pub fn write_audio_packet(
        &mut self,
        packet: Vec<u8>,
        granule_position: u64,
        end_of_stream: bool,
    ) -> io::Result<()> {
        let end_info = if end_of_stream {
            PacketWriteEndInfo::EndStream
        } else {
            PacketWriteEndInfo::NormalPacket
        };
        self.writer
            .write_packet(packet, self.serial, end_info, granule_position)
    }

    /// Flush everything down to the file.
    pub fn finish(self) -> io::Result<()> {
        self.writer.into_inner().flush()
    }
}
