#![no_main]
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(image) = heapscope::formats::elf::ElfImage::parse(Bytes::copy_from_slice(data)) {
        for sym in image.symbols().iter().take(64) {
            let _ = image.find_symbol_by_offset(sym.offset);
            let _ = image.find_symbol_by_name(&sym.name);
        }
    }
});
