//! Synthetic SDAT fixtures for tests and benches.
//!
//! Builds small but structurally complete archives: header, SYMB, INFO,
//! FAT and FILE blocks, with helpers for the SSEQ, SSAR, SBNK, SWAR and
//! STRM files they contain.

pub const SSEQ_DATA_OFFSET: u32 = 0x1C;

fn put_u16(d: &mut [u8], at: usize, v: u16) {
    d[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(d: &mut [u8], at: usize, v: u32) {
    d[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn align4(d: &mut Vec<u8>) {
    while d.len() % 4 != 0 {
        d.push(0);
    }
}

/// An SSEQ file wrapping `program`.
pub fn sseq_file(program: &[u8]) -> Vec<u8> {
    let mut d = vec![0u8; SSEQ_DATA_OFFSET as usize];
    d[0..4].copy_from_slice(b"SSEQ");
    put_u32(&mut d, 0x18, SSEQ_DATA_OFFSET);
    d.extend_from_slice(program);
    d
}

/// An SSAR file: `(pc, bank)` per sub-sequence, all sharing `program`.
pub fn ssar_file(entries: &[(u32, u16)], program: &[u8]) -> Vec<u8> {
    let data_offset = 0x20 + entries.len() * 12;
    let mut d = vec![0u8; data_offset];
    d[0..4].copy_from_slice(b"SSAR");
    put_u32(&mut d, 0x18, data_offset as u32);
    put_u32(&mut d, 0x1C, entries.len() as u32);
    for (i, &(pc, bank)) in entries.iter().enumerate() {
        let at = 0x20 + i * 12;
        put_u32(&mut d, at, pc);
        put_u16(&mut d, at + 4, bank);
        d[at + 6] = 127;
        d[at + 7] = 64;
        d[at + 8] = 64;
    }
    d.extend_from_slice(program);
    d
}

/// One instrument region.
#[derive(Clone, Copy, Debug)]
pub struct Region {
    pub tag: u8,
    pub sample: u16,
    pub slot: u16,
    pub note: u8,
    pub attack: u8,
    pub decay: u8,
    pub sustain: u8,
    pub release: u8,
    pub pan: u8,
}

impl Region {
    /// A sample region with an instant attack, slow decay and audible sustain.
    pub fn sample(sample: u16, slot: u16, note: u8) -> Self {
        Self {
            tag: 1,
            sample,
            slot,
            note,
            attack: 127,
            decay: 100,
            sustain: 100,
            release: 100,
            pan: 64,
        }
    }

    pub fn with_adsr(mut self, attack: u8, decay: u8, sustain: u8, release: u8) -> Self {
        self.attack = attack;
        self.decay = decay;
        self.sustain = sustain;
        self.release = release;
        self
    }

    fn body(&self) -> [u8; 10] {
        let s = self.sample.to_le_bytes();
        let w = self.slot.to_le_bytes();
        [
            s[0],
            s[1],
            w[0],
            w[1],
            self.note,
            self.attack,
            self.decay,
            self.sustain,
            self.release,
            self.pan,
        ]
    }
}

/// One SBNK program slot.
#[derive(Clone, Debug)]
pub enum Instrument {
    Empty,
    Single(Region),
    Pulse(Region),
    Noise(Region),
    Drumset { lower: u8, upper: u8, regions: Vec<Region> },
    Multi { ends: Vec<u8>, regions: Vec<Region> },
}

/// An SBNK file holding `instruments` in program order.
pub fn sbnk_file(instruments: &[Instrument]) -> Vec<u8> {
    let mut d = vec![0u8; 0x3C + instruments.len() * 4];
    d[0..4].copy_from_slice(b"SBNK");
    put_u32(&mut d, 0x38, instruments.len() as u32);
    for (j, inst) in instruments.iter().enumerate() {
        let entry = 0x3C + j * 4;
        let at = d.len() as u16;
        let (tag, body) = match inst {
            Instrument::Empty => (0u8, Vec::new()),
            Instrument::Single(r) => (1, r.body().to_vec()),
            Instrument::Pulse(r) => (2, r.body().to_vec()),
            Instrument::Noise(r) => (3, r.body().to_vec()),
            Instrument::Drumset { lower, upper, regions } => {
                let mut b = vec![*lower, *upper];
                for r in regions {
                    b.extend_from_slice(&[r.tag, 0]);
                    b.extend_from_slice(&r.body());
                }
                (0x10, b)
            }
            Instrument::Multi { ends, regions } => {
                let mut b = vec![0u8; 8];
                b[..ends.len()].copy_from_slice(ends);
                for r in regions {
                    b.extend_from_slice(&[r.tag, 0]);
                    b.extend_from_slice(&r.body());
                }
                (0x11, b)
            }
        };
        d[entry] = tag;
        if tag != 0 {
            put_u16(&mut d, entry + 1, at);
            d.extend_from_slice(&body);
        }
    }
    d
}

/// One SWAV: PCM8 payload, rate and loop settings.
#[derive(Clone, Debug)]
pub struct Wave {
    pub wave_type: u8,
    pub looping: bool,
    pub rate: u16,
    pub timer: u16,
    pub loop_words: u16,
    pub data: Vec<u8>,
}

impl Wave {
    /// A one-shot PCM8 wave of `len` bytes (rounded up to whole words).
    pub fn pcm8(len: usize, value: i8) -> Self {
        let words = len.div_ceil(4);
        Self {
            wave_type: 0,
            looping: false,
            rate: 32768,
            timer: 0,
            loop_words: 0,
            data: vec![value as u8; words * 4],
        }
    }

    pub fn looped(mut self, loop_words: u16) -> Self {
        self.looping = true;
        self.loop_words = loop_words;
        self
    }
}

/// A SWAR file holding `waves`.
pub fn swar_file(waves: &[Wave]) -> Vec<u8> {
    let mut d = vec![0u8; 0x3C + waves.len() * 4];
    d[0..4].copy_from_slice(b"SWAR");
    put_u32(&mut d, 0x38, waves.len() as u32);
    for (j, w) in waves.iter().enumerate() {
        let at = d.len() as u32;
        put_u32(&mut d, 0x3C + j * 4, at);
        let total_words = (w.data.len() / 4) as u32;
        d.push(w.wave_type);
        d.push(w.looping as u8);
        d.extend_from_slice(&w.rate.to_le_bytes());
        d.extend_from_slice(&w.timer.to_le_bytes());
        d.extend_from_slice(&w.loop_words.to_le_bytes());
        d.extend_from_slice(&(total_words - w.loop_words as u32).to_le_bytes());
        d.extend_from_slice(&w.data);
    }
    d
}

/// A mono or stereo PCM8 STRM with one block per channel.
pub fn strm_file(channels: &[&[i8]], rate: u16, looping: bool, loop_point: u32) -> Vec<u8> {
    let block_len = channels.first().map_or(0, |c| c.len());
    let mut d = vec![0u8; 0x68];
    d[0..4].copy_from_slice(b"STRM");
    d[0x18] = 0;
    d[0x19] = looping as u8;
    d[0x1A] = channels.len() as u8;
    put_u16(&mut d, 0x1C, rate);
    put_u32(&mut d, 0x20, loop_point);
    put_u32(&mut d, 0x24, block_len as u32);
    put_u32(&mut d, 0x2C, 1);
    put_u32(&mut d, 0x30, block_len as u32);
    put_u32(&mut d, 0x34, block_len as u32);
    put_u32(&mut d, 0x38, block_len as u32);
    put_u32(&mut d, 0x3C, block_len as u32);
    for c in channels {
        d.extend(c.iter().map(|&v| v as u8));
    }
    d
}

struct Entry {
    name: Option<String>,
    record: Vec<u8>,
}

/// Assembles an SDAT. Each `add_*` call returns the new entry's id.
#[derive(Default)]
pub struct SdatBuilder {
    files: Vec<Vec<u8>>,
    sequences: Vec<Entry>,
    archives: Vec<(Entry, Vec<Option<String>>)>,
    banks: Vec<Entry>,
    wave_archives: Vec<Entry>,
    streams: Vec<Entry>,
    symbols: bool,
}

impl SdatBuilder {
    pub fn new() -> Self {
        Self { symbols: true, ..Default::default() }
    }

    /// Omit the SYMB block.
    pub fn without_symbols(mut self) -> Self {
        self.symbols = false;
        self
    }

    fn add_file(&mut self, data: Vec<u8>) -> u16 {
        self.files.push(data);
        (self.files.len() - 1) as u16
    }

    pub fn add_sequence(&mut self, name: &str, program: &[u8], bank: u16) -> u16 {
        let file = self.add_file(sseq_file(program));
        let mut record = vec![0u8; 12];
        put_u16(&mut record, 0, file);
        put_u16(&mut record, 4, bank);
        record[6] = 127;
        record[7] = 64;
        record[8] = 64;
        self.sequences.push(Entry { name: Some(name.into()), record });
        (self.sequences.len() - 1) as u16
    }

    /// An INFO slot with a zero record offset.
    pub fn add_absent_sequence(&mut self) -> u16 {
        self.sequences.push(Entry { name: None, record: Vec::new() });
        (self.sequences.len() - 1) as u16
    }

    pub fn add_archive(&mut self, name: &str, entries: &[(u32, u16)], sub_names: &[&str], program: &[u8]) -> u16 {
        let file = self.add_file(ssar_file(entries, program));
        let mut record = vec![0u8; 4];
        put_u16(&mut record, 0, file);
        let subs = sub_names.iter().map(|s| Some(s.to_string())).collect();
        self.archives.push((Entry { name: Some(name.into()), record }, subs));
        (self.archives.len() - 1) as u16
    }

    /// A bank linking up to four wave-archive ids (0xFFFF for none).
    pub fn add_bank(&mut self, name: &str, instruments: &[Instrument], wave_archives: [u16; 4]) -> u16 {
        let file = self.add_file(sbnk_file(instruments));
        let mut record = vec![0u8; 12];
        put_u16(&mut record, 0, file);
        for (i, &w) in wave_archives.iter().enumerate() {
            put_u16(&mut record, 4 + i * 2, w);
        }
        self.banks.push(Entry { name: Some(name.into()), record });
        (self.banks.len() - 1) as u16
    }

    pub fn add_wave_archive(&mut self, waves: &[Wave]) -> u16 {
        let file = self.add_file(swar_file(waves));
        let mut record = vec![0u8; 4];
        put_u16(&mut record, 0, file);
        self.wave_archives.push(Entry { name: None, record });
        (self.wave_archives.len() - 1) as u16
    }

    pub fn add_stream(&mut self, name: &str, strm: Vec<u8>) -> u16 {
        let file = self.add_file(strm);
        let mut record = vec![0u8; 12];
        put_u16(&mut record, 0, file);
        self.streams.push(Entry { name: Some(name.into()), record });
        (self.streams.len() - 1) as u16
    }

    fn build_symb(&self) -> Vec<u8> {
        let mut d = vec![0u8; 0x40];
        d[0..4].copy_from_slice(b"SYMB");
        let mut strings: Vec<(usize, String)> = Vec::new();

        let mut simple_list = |d: &mut Vec<u8>, pointer: usize, names: Vec<Option<String>>| {
            let list = d.len();
            put_u32(d, pointer, list as u32);
            d.extend_from_slice(&(names.len() as u32).to_le_bytes());
            for name in names {
                let at = d.len();
                d.extend_from_slice(&[0; 4]);
                if let Some(n) = name {
                    strings.push((at, n));
                }
            }
        };
        simple_list(&mut d, 0x08, self.sequences.iter().map(|e| e.name.clone()).collect());
        simple_list(&mut d, 0x10, self.banks.iter().map(|e| e.name.clone()).collect());
        simple_list(&mut d, 0x14, self.wave_archives.iter().map(|e| e.name.clone()).collect());
        simple_list(&mut d, 0x24, self.streams.iter().map(|e| e.name.clone()).collect());

        // SSAR list: count, then (name offset, sub-list offset) pairs
        let list = d.len();
        put_u32(&mut d, 0x0C, list as u32);
        d.extend_from_slice(&(self.archives.len() as u32).to_le_bytes());
        let mut sub_lists = Vec::new();
        for (entry, subs) in &self.archives {
            let at = d.len();
            d.extend_from_slice(&[0; 8]);
            if let Some(n) = &entry.name {
                strings.push((at, n.clone()));
            }
            sub_lists.push((at + 4, subs.clone()));
        }
        for (pointer, subs) in sub_lists {
            let sub = d.len();
            put_u32(&mut d, pointer, sub as u32);
            d.extend_from_slice(&(subs.len() as u32).to_le_bytes());
            for name in subs {
                let at = d.len();
                d.extend_from_slice(&[0; 4]);
                if let Some(n) = name {
                    strings.push((at, n));
                }
            }
        }

        for (pointer, s) in strings {
            let at = d.len();
            put_u32(&mut d, pointer, at as u32);
            d.extend_from_slice(s.as_bytes());
            d.push(0);
        }
        align4(&mut d);
        let size = d.len() as u32;
        put_u32(&mut d, 4, size);
        d
    }

    fn build_info(&self) -> Vec<u8> {
        let mut d = vec![0u8; 0x40];
        d[0..4].copy_from_slice(b"INFO");
        let archive_entries: Vec<&Entry> = self.archives.iter().map(|(e, _)| e).collect();
        let lists: [(usize, Vec<&Entry>); 5] = [
            (0x08, self.sequences.iter().collect()),
            (0x0C, archive_entries),
            (0x10, self.banks.iter().collect()),
            (0x14, self.wave_archives.iter().collect()),
            (0x24, self.streams.iter().collect()),
        ];
        for (pointer, entries) in lists {
            let list = d.len();
            put_u32(&mut d, pointer, list as u32);
            d.extend_from_slice(&(entries.len() as u32).to_le_bytes());
            let slots = d.len();
            d.resize(slots + entries.len() * 4, 0);
            for (i, e) in entries.iter().enumerate() {
                if e.record.is_empty() {
                    continue;
                }
                let at = d.len();
                put_u32(&mut d, slots + i * 4, at as u32);
                d.extend_from_slice(&e.record);
            }
        }
        align4(&mut d);
        let size = d.len() as u32;
        put_u32(&mut d, 4, size);
        d
    }

    pub fn build(&self) -> Vec<u8> {
        let symb = if self.symbols { self.build_symb() } else { Vec::new() };
        let info = self.build_info();
        let fat_len = 0x0C + self.files.len() * 0x10;

        let symb_offset = 0x40;
        let info_offset = symb_offset + symb.len();
        let fat_offset = info_offset + info.len();
        let file_offset = fat_offset + fat_len;

        let mut fat = vec![0u8; fat_len];
        fat[0..4].copy_from_slice(b"FAT ");
        put_u32(&mut fat, 4, fat_len as u32);
        put_u32(&mut fat, 8, self.files.len() as u32);

        let mut file_block = vec![0u8; 0x0C];
        file_block[0..4].copy_from_slice(b"FILE");
        put_u32(&mut file_block, 8, self.files.len() as u32);
        for (i, f) in self.files.iter().enumerate() {
            align4(&mut file_block);
            let at = file_offset + file_block.len();
            put_u32(&mut fat, 0x0C + i * 0x10, at as u32);
            put_u32(&mut fat, 0x0C + i * 0x10 + 4, f.len() as u32);
            file_block.extend_from_slice(f);
        }
        align4(&mut file_block);
        let file_len = file_block.len() as u32;
        put_u32(&mut file_block, 4, file_len);

        let mut d = vec![0u8; 0x40];
        d[0..4].copy_from_slice(b"SDAT");
        d[4..8].copy_from_slice(&[0xFF, 0xFE, 0x00, 0x01]);
        put_u16(&mut d, 0x0C, 64);
        put_u16(&mut d, 0x0E, if self.symbols { 4 } else { 3 });
        if self.symbols {
            put_u32(&mut d, 0x10, symb_offset as u32);
            put_u32(&mut d, 0x14, symb.len() as u32);
        }
        put_u32(&mut d, 0x18, info_offset as u32);
        put_u32(&mut d, 0x1C, info.len() as u32);
        put_u32(&mut d, 0x20, fat_offset as u32);
        put_u32(&mut d, 0x24, fat_len as u32);
        put_u32(&mut d, 0x28, file_offset as u32);
        put_u32(&mut d, 0x2C, file_len);

        d.extend_from_slice(&symb);
        d.extend_from_slice(&info);
        d.extend_from_slice(&fat);
        d.extend_from_slice(&file_block);
        let total = d.len() as u32;
        put_u32(&mut d, 0x08, total);
        d
    }
}

/// Wrap `data` in an LZSS stream made of literals only.
pub fn lzss_literals(data: &[u8]) -> Vec<u8> {
    let mut out = (((data.len() as u32) << 8) | 0x10).to_le_bytes().to_vec();
    for chunk in data.chunks(8) {
        out.push(0);
        out.extend_from_slice(chunk);
    }
    out
}
