//! Minimal ELF64 little-endian image writer for integration tests.

const ET_EXEC: u16 = 2;
const ET_DYN: u16 = 3;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const FUNC_GLOBAL: u8 = 0x12;

pub struct ElfBuilder {
    e_type: u16,
    symbols: Vec<(String, u64, u64)>,
}

impl ElfBuilder {
    pub fn shared_object() -> Self {
        Self {
            e_type: ET_DYN,
            symbols: Vec::new(),
        }
    }

    pub fn executable() -> Self {
        Self {
            e_type: ET_EXEC,
            symbols: Vec::new(),
        }
    }

    pub fn symbol(mut self, name: &str, value: u64, size: u64) -> Self {
        self.symbols.push((name.to_string(), value, size));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut strtab = vec![0u8];
        let mut symtab = vec![0u8; 24];
        for (name, value, size) in &self.symbols {
            symtab.extend_from_slice(&(strtab.len() as u32).to_le_bytes());
            symtab.push(FUNC_GLOBAL);
            symtab.push(0);
            symtab.extend_from_slice(&1u16.to_le_bytes());
            symtab.extend_from_slice(&value.to_le_bytes());
            symtab.extend_from_slice(&size.to_le_bytes());
            strtab.extend_from_slice(name.as_bytes());
            strtab.push(0);
        }
        let shstrtab = b"\0.symtab\0.strtab\0.shstrtab\0".to_vec();
        // (name offset in shstrtab, type, link, entsize, body)
        let sections = [
            (1u32, SHT_SYMTAB, 2u32, 24u64, symtab),
            (9, SHT_STRTAB, 0, 0, strtab),
            (17, SHT_STRTAB, 0, 0, shstrtab),
        ];

        let mut body = Vec::new();
        let mut placed = Vec::new();
        for (.., contents) in &sections {
            while (64 + body.len()) % 8 != 0 {
                body.push(0);
            }
            placed.push((64 + body.len()) as u64);
            body.extend_from_slice(contents);
        }
        while (64 + body.len()) % 8 != 0 {
            body.push(0);
        }
        let shoff = (64 + body.len()) as u64;

        let mut out = Vec::new();
        out.extend_from_slice(b"\x7fELF");
        out.extend_from_slice(&[2, 1, 1]);
        out.extend_from_slice(&[0u8; 9]);
        out.extend_from_slice(&self.e_type.to_le_bytes());
        out.extend_from_slice(&62u16.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&0u64.to_le_bytes()); // entry
        out.extend_from_slice(&0u64.to_le_bytes()); // phoff
        out.extend_from_slice(&shoff.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&64u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&64u16.to_le_bytes());
        out.extend_from_slice(&4u16.to_le_bytes()); // shnum
        out.extend_from_slice(&3u16.to_le_bytes()); // shstrndx
        out.extend_from_slice(&body);

        out.extend(std::iter::repeat(0u8).take(64));
        for (i, (name, ty, link, entsize, contents)) in sections.iter().enumerate() {
            out.extend_from_slice(&name.to_le_bytes());
            out.extend_from_slice(&ty.to_le_bytes());
            out.extend_from_slice(&0u64.to_le_bytes()); // flags
            out.extend_from_slice(&0u64.to_le_bytes()); // addr
            out.extend_from_slice(&placed[i].to_le_bytes());
            out.extend_from_slice(&(contents.len() as u64).to_le_bytes());
            out.extend_from_slice(&link.to_le_bytes());
            let info: u32 = if *ty == SHT_SYMTAB { 1 } else { 0 };
            out.extend_from_slice(&info.to_le_bytes());
            out.extend_from_slice(&8u64.to_le_bytes());
            out.extend_from_slice(&entsize.to_le_bytes());
        }
        out
    }
}
