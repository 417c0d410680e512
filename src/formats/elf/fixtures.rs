//! Synthetic ELF images for unit tests.

use crate::formats::elf::types::*;

struct RawSym {
    name: String,
    value: u64,
    size: u64,
    info: u8,
    shndx: u16,
}

pub struct ImageBuilder {
    class: ElfClass,
    endian: ElfData,
    e_type: u16,
    entry: u64,
    sections: bool,
    symtab: Vec<RawSym>,
    dynsym: Vec<RawSym>,
}

impl ImageBuilder {
    fn new(e_type: u16) -> Self {
        Self {
            class: ElfClass::Elf64,
            endian: ElfData::Little,
            e_type,
            entry: 0,
            sections: true,
            symtab: Vec::new(),
            dynsym: Vec::new(),
        }
    }

    pub fn shared_object() -> Self {
        Self::new(3)
    }

    pub fn executable() -> Self {
        Self::new(2)
    }

    pub fn elf32(mut self) -> Self {
        self.class = ElfClass::Elf32;
        self
    }

    pub fn big_endian(mut self) -> Self {
        self.endian = ElfData::Big;
        self
    }

    pub fn entry(mut self, entry: u64) -> Self {
        self.entry = entry;
        self
    }

    pub fn without_sections(mut self) -> Self {
        self.sections = false;
        self
    }

    pub fn symbol(self, name: &str, value: u64, size: u64) -> Self {
        self.raw_symbol(name, value, size, (STB_GLOBAL << 4) | STT_FUNC, 1)
    }

    pub fn raw_symbol(mut self, name: &str, value: u64, size: u64, info: u8, shndx: u16) -> Self {
        self.symtab.push(RawSym {
            name: name.to_string(),
            value,
            size,
            info,
            shndx,
        });
        self
    }

    pub fn dynamic_symbol(mut self, name: &str, value: u64, size: u64) -> Self {
        self.dynsym.push(RawSym {
            name: name.to_string(),
            value,
            size,
            info: (STB_GLOBAL << 4) | STT_FUNC,
            shndx: 1,
        });
        self
    }

    fn put16(&self, out: &mut Vec<u8>, v: u16) {
        match self.endian {
            ElfData::Little => out.extend_from_slice(&v.to_le_bytes()),
            ElfData::Big => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn put32(&self, out: &mut Vec<u8>, v: u32) {
        match self.endian {
            ElfData::Little => out.extend_from_slice(&v.to_le_bytes()),
            ElfData::Big => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn put64(&self, out: &mut Vec<u8>, v: u64) {
        match self.endian {
            ElfData::Little => out.extend_from_slice(&v.to_le_bytes()),
            ElfData::Big => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn put_word(&self, out: &mut Vec<u8>, v: u64) {
        match self.class {
            ElfClass::Elf32 => self.put32(out, v as u32),
            ElfClass::Elf64 => self.put64(out, v),
        }
    }

    /// String table plus symbol table bytes for one symbol list.
    fn tables(&self, syms: &[RawSym]) -> (Vec<u8>, Vec<u8>) {
        let mut strtab = vec![0u8];
        let mut symtab = vec![0u8; self.class.symbol_entry_size()];
        for sym in syms {
            let name_off = strtab.len() as u32;
            strtab.extend_from_slice(sym.name.as_bytes());
            strtab.push(0);
            match self.class {
                ElfClass::Elf32 => {
                    self.put32(&mut symtab, name_off);
                    self.put32(&mut symtab, sym.value as u32);
                    self.put32(&mut symtab, sym.size as u32);
                    symtab.push(sym.info);
                    symtab.push(0);
                    self.put16(&mut symtab, sym.shndx);
                }
                ElfClass::Elf64 => {
                    self.put32(&mut symtab, name_off);
                    symtab.push(sym.info);
                    symtab.push(0);
                    self.put16(&mut symtab, sym.shndx);
                    self.put64(&mut symtab, sym.value);
                    self.put64(&mut symtab, sym.size);
                }
            }
        }
        (strtab, symtab)
    }

    pub fn build(&self) -> Vec<u8> {
        let ehsize = self.class.header_size();
        let shentsize = self.class.section_header_size();
        let symentsize = self.class.symbol_entry_size() as u64;

        // (name, type, link, entsize, contents)
        let mut sections: Vec<(&str, u32, u32, u64, Vec<u8>)> = Vec::new();
        if self.sections {
            let (strtab, symtab) = self.tables(&self.symtab);
            sections.push((".symtab", SHT_SYMTAB, 2, symentsize, symtab));
            sections.push((".strtab", SHT_STRTAB, 0, 0, strtab));
            if !self.dynsym.is_empty() {
                let (dynstr, dynsym) = self.tables(&self.dynsym);
                sections.push((".dynsym", SHT_DYNSYM, 4, symentsize, dynsym));
                sections.push((".dynstr", SHT_STRTAB, 0, 0, dynstr));
            }
            let mut shstrtab = vec![0u8];
            let mut names = Vec::new();
            for (name, ..) in &sections {
                names.push(shstrtab.len() as u32);
                shstrtab.extend_from_slice(name.as_bytes());
                shstrtab.push(0);
            }
            let shstr_name = shstrtab.len() as u32;
            shstrtab.extend_from_slice(b".shstrtab\0");
            sections.push((".shstrtab", SHT_STRTAB, 0, 0, shstrtab));
            names.push(shstr_name);

            // Section bodies follow the header, 8-byte aligned.
            let mut body = Vec::new();
            let mut placed = Vec::new();
            for (_, _, _, _, contents) in &sections {
                while (ehsize + body.len()) % 8 != 0 {
                    body.push(0);
                }
                placed.push(((ehsize + body.len()) as u64, contents.len() as u64));
                body.extend_from_slice(contents);
            }
            while (ehsize + body.len()) % 8 != 0 {
                body.push(0);
            }
            let shoff = (ehsize + body.len()) as u64;
            let shnum = (sections.len() + 1) as u16;

            let mut out = self.header(shoff, shnum, shnum - 1);
            out.extend_from_slice(&body);
            out.extend(std::iter::repeat(0u8).take(shentsize));
            for (i, (_, ty, link, entsize, _)) in sections.iter().enumerate() {
                let (offset, size) = placed[i];
                self.put32(&mut out, names[i]);
                self.put32(&mut out, *ty);
                self.put_word(&mut out, 0);
                self.put_word(&mut out, 0);
                self.put_word(&mut out, offset);
                self.put_word(&mut out, size);
                self.put32(&mut out, *link);
                self.put32(&mut out, if *ty == SHT_STRTAB { 0 } else { 1 });
                self.put_word(&mut out, 8);
                self.put_word(&mut out, *entsize);
            }
            out
        } else {
            self.header(0, 0, 0)
        }
    }

    fn header(&self, shoff: u64, shnum: u16, shstrndx: u16) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.class.header_size());
        out.extend_from_slice(ELF_MAGIC);
        out.push(self.class as u8);
        out.push(self.endian as u8);
        out.push(1);
        out.extend_from_slice(&[0u8; 9]);
        self.put16(&mut out, self.e_type);
        self.put16(&mut out, 62);
        self.put32(&mut out, 1);
        self.put_word(&mut out, self.entry);
        self.put_word(&mut out, 0);
        self.put_word(&mut out, shoff);
        self.put32(&mut out, 0);
        self.put16(&mut out, self.class.header_size() as u16);
        self.put16(&mut out, 0);
        self.put16(&mut out, 0);
        self.put16(&mut out, self.class.section_header_size() as u16);
        self.put16(&mut out, shnum);
        self.put16(&mut out, shstrndx);
        out
    }
}
