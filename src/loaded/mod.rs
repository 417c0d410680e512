//! Shared objects and executables mapped into the target.
//!
//! A [`LoadedObject`] knows where an image sits in the target and lazily
//! parses the image itself, either from the file on disk or from the
//! target's memory. Symbol queries translate between image offsets and
//! absolute addresses.

pub mod directory;

pub use directory::ObjectDirectory;

use crate::core::address::Address;
use crate::core::memo::{Memoized, MemoizedBool};
use crate::demangle;
use crate::error::{InspectError, Result};
use crate::formats::elf::{ElfError, ElfImage, ImageSource};
use crate::io::IOLimits;
use crate::target::Target;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of the one-time image parse.
enum ImageState {
    Parsed(Arc<ElfImage>),
    /// The bytes were read but are not a usable ELF image.
    Malformed(ElfError),
}

/// Nearest symbol to a program counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosestSymbol {
    pub name: String,
    /// Distance from the symbol's start to the queried location.
    pub offset: u64,
}

impl ClosestSymbol {
    /// Human-readable name for C++ and Rust symbols, falling back to the raw name.
    pub fn demangled_name(&self) -> String {
        demangle::demangle_one(&self.name)
            .map(|r| r.demangled)
            .unwrap_or_else(|| self.name.clone())
    }
}

impl fmt::Display for ClosestSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}+{:#x}", self.name, self.offset)
        }
    }
}

/// Source line for a program counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInfo {
    pub file: PathBuf,
    pub line: u32,
}

/// One image mapped into the target's address space.
pub struct LoadedObject {
    name: Option<String>,
    source: ImageSource,
    base: Address,
    size: u64,
    target: Target,
    limits: IOLimits,
    image: Memoized<LoadedObject, ImageState, InspectError>,
    shared: MemoizedBool<LoadedObject, InspectError>,
    parse_count: AtomicUsize,
}

impl LoadedObject {
    fn with_source(
        target: Target,
        name: Option<String>,
        source: ImageSource,
        size: u64,
        base: Address,
        limits: IOLimits,
    ) -> Self {
        Self {
            name,
            source,
            base,
            size,
            target,
            limits,
            image: Memoized::new(load_image),
            shared: Memoized::new(compute_is_shared),
            parse_count: AtomicUsize::new(0),
        }
    }

    /// An object whose image is read from `path` on first use.
    pub fn from_file<P: AsRef<Path>>(
        target: Target,
        path: P,
        size: u64,
        base: Address,
        limits: IOLimits,
    ) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = Some(path.display().to_string());
        Self::with_source(target, name, ImageSource::File(path), size, base, limits)
    }

    /// An object whose image is read out of the target at `base` on first use.
    pub fn from_memory(target: Target, size: u64, base: Address, limits: IOLimits) -> Self {
        let source = ImageSource::TargetMemory {
            base: base.value(),
            size,
        };
        Self::with_source(target, None, source, size, base, limits)
    }

    /// File path for file-backed objects; `None` when resolved by address.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn base(&self) -> Address {
        self.base
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// True when `addr` lies inside `[base, base + size)`.
    pub fn contains(&self, addr: Address) -> bool {
        addr.offset_from(self.base)
            .is_some_and(|offset| offset < self.size)
    }

    /// Number of times the image has been loaded and parsed.
    pub fn parse_count(&self) -> usize {
        self.parse_count.load(Ordering::SeqCst)
    }

    /// The parsed image.
    ///
    /// # Errors
    ///
    /// `MalformedBinary` when the image does not parse; the failure is
    /// remembered and the image is not parsed again. Read failures are
    /// returned as-is and retried on the next call.
    pub fn image(&self) -> Result<Arc<ElfImage>> {
        match self.image.get(self)? {
            ImageState::Parsed(image) => Ok(Arc::clone(image)),
            ImageState::Malformed(err) => Err(InspectError::MalformedBinary(err.clone())),
        }
    }

    /// The image for symbol queries. Only the query that first discovers a
    /// malformed image sees the error; later ones get `None`.
    fn queryable_image(&self) -> Result<Option<Arc<ElfImage>>> {
        match self.image.get_tracked(self)? {
            (ImageState::Parsed(image), _) => Ok(Some(Arc::clone(image))),
            (ImageState::Malformed(err), true) => Err(InspectError::MalformedBinary(err.clone())),
            (ImageState::Malformed(_), false) => Ok(None),
        }
    }

    /// Whether the image is a shared object (`ET_DYN`).
    pub fn is_shared_object(&self) -> Result<bool> {
        self.shared.get(self).copied()
    }

    /// Move the object to a new base after an unload and reload.
    ///
    /// Images read from a file stay cached since the file did not change.
    /// Images read from target memory are dropped along with the
    /// shared-object flag and re-read from the new base on next use.
    pub fn set_base(&mut self, new_base: Address) {
        let old_base = self.base;
        self.base = new_base;
        if let ImageSource::TargetMemory { base, .. } = &mut self.source {
            *base = new_base.value();
            self.image.invalidate();
            self.shared.invalidate();
        }
        debug!(
            object = self.name().unwrap_or("<memory>"),
            old_base = %old_base,
            new_base = %new_base,
            "Rebased loaded object"
        );
    }

    /// Absolute address of the named symbol.
    ///
    /// Shared objects are position independent, so their symbol offsets are
    /// relative to `base`; executables carry absolute values.
    pub fn lookup_symbol(&self, name: &str) -> Result<Option<Address>> {
        let Some(image) = self.queryable_image()? else {
            return Ok(None);
        };
        let Some(symbol) = image.find_symbol_by_name(name) else {
            debug!(symbol = name, object = self.name().unwrap_or("<memory>"), "Symbol not found");
            return Ok(None);
        };

        let addr = if self.is_shared_object()? {
            self.base.add(symbol.offset)?
        } else {
            self.target.address(symbol.offset)?
        };
        Ok(Some(addr))
    }

    /// Name of the closest symbol at or below `pc`, with the distance to it.
    pub fn closest_symbol_to_pc(&self, pc: Address) -> Result<Option<ClosestSymbol>> {
        let Some(image) = self.queryable_image()? else {
            return Ok(None);
        };

        let offset = if self.is_shared_object()? {
            match pc.offset_from(self.base) {
                Some(offset) => offset,
                None => return Ok(None),
            }
        } else {
            self.target.width().address_value(pc)
        };

        Ok(image
            .find_symbol_by_offset(offset)
            .map(|symbol| ClosestSymbol {
                name: symbol.name.clone(),
                offset: offset - symbol.offset,
            }))
    }

    /// Source line for `pc`.
    ///
    /// Line tables are not read, so this is always `None`; callers format
    /// frames without line numbers instead of failing.
    pub fn line_number_for_pc(&self, _pc: Address) -> Option<LineInfo> {
        None
    }

    /// Whether line-number information can be queried. Always `false`.
    pub fn has_debug_info(&self) -> bool {
        false
    }
}

fn load_image(obj: &LoadedObject) -> Result<ImageState> {
    obj.parse_count.fetch_add(1, Ordering::SeqCst);
    match obj.source.load(&obj.target, &obj.limits) {
        Ok(image) => {
            debug!(
                object = obj.name().unwrap_or("<memory>"),
                base = %obj.base,
                file_type = %image.file_type(),
                "Loaded image"
            );
            Ok(ImageState::Parsed(Arc::new(image)))
        }
        Err(InspectError::MalformedBinary(err)) => {
            warn!(
                object = obj.name().unwrap_or("<memory>"),
                base = %obj.base,
                error = %err,
                "Image is not introspectable"
            );
            Ok(ImageState::Malformed(err))
        }
        Err(err) => Err(err),
    }
}

fn compute_is_shared(obj: &LoadedObject) -> Result<bool> {
    obj.image().map(|image| image.is_shared_object())
}

impl PartialEq for LoadedObject {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}

impl Eq for LoadedObject {}

impl Hash for LoadedObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base.hash(state);
    }
}

impl fmt::Debug for LoadedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedObject")
            .field("name", &self.name)
            .field("base", &format_args!("{}", self.base))
            .field("size", &format_args!("{:#x}", self.size))
            .field("shared", &self.shared.peek())
            .field("parse_count", &self.parse_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::elf::fixtures::ImageBuilder;
    use crate::target::SnapshotMemory;

    const BASE: u64 = 0x7f00_0000_0000;

    fn image_bytes() -> Vec<u8> {
        ImageBuilder::shared_object()
            .symbol("foo", 0x100, 0x20)
            .symbol("bar", 0x200, 0x10)
            .build()
    }

    fn memory_object(bytes: Vec<u8>) -> (Arc<SnapshotMemory>, LoadedObject) {
        let memory = Arc::new(SnapshotMemory::new());
        let size = bytes.len() as u64;
        memory.map_region(BASE, bytes);
        let target = Target::lp64(memory.clone());
        let obj = LoadedObject::from_memory(target, size, Address::new64(BASE), IOLimits::default());
        (memory, obj)
    }

    #[test]
    fn resolves_symbols_relative_to_base() {
        let (_, obj) = memory_object(image_bytes());
        assert!(obj.name().is_none());
        assert!(obj.is_shared_object().unwrap());
        assert_eq!(
            obj.lookup_symbol("bar").unwrap(),
            Some(Address::new64(BASE + 0x200))
        );
        assert_eq!(obj.lookup_symbol("missing").unwrap(), None);

        let closest = obj
            .closest_symbol_to_pc(Address::new64(BASE + 0x150))
            .unwrap()
            .unwrap();
        assert_eq!(closest.name, "foo");
        assert_eq!(closest.offset, 0x50);
        assert_eq!(closest.to_string(), "foo+0x50");
        assert_eq!(obj.parse_count(), 1);
    }

    #[test]
    fn pc_below_base_has_no_symbol() {
        let (_, obj) = memory_object(image_bytes());
        assert_eq!(obj.closest_symbol_to_pc(Address::new64(BASE - 1)).unwrap(), None);
    }

    #[test]
    fn malformed_image_reports_once_then_not_found() {
        let (_, obj) = memory_object(vec![0x55; 256]);

        let first = obj.lookup_symbol("foo").unwrap_err();
        assert!(first.is_malformed());
        assert_eq!(obj.lookup_symbol("foo").unwrap(), None);
        assert_eq!(obj.closest_symbol_to_pc(Address::new64(BASE)).unwrap(), None);
        assert!(obj.image().unwrap_err().is_malformed());
        assert!(obj.is_shared_object().is_err());
        assert_eq!(obj.parse_count(), 1);
    }

    #[test]
    fn read_failures_are_retried() {
        let memory = Arc::new(SnapshotMemory::new());
        let bytes = image_bytes();
        let size = bytes.len() as u64;
        let target = Target::lp64(memory.clone());
        let obj = LoadedObject::from_memory(target, size, Address::new64(BASE), IOLimits::default());

        let err = obj.is_shared_object().unwrap_err();
        assert!(matches!(err, InspectError::ProcessRead(_)));

        memory.map_region(BASE, bytes);
        assert!(obj.is_shared_object().unwrap());
        assert_eq!(obj.parse_count(), 2);
    }

    #[test]
    fn oversized_region_is_rejected() {
        let memory = Arc::new(SnapshotMemory::new());
        let limits = IOLimits {
            max_file_size: 16,
            max_read_bytes: 16,
        };
        let obj = LoadedObject::from_memory(Target::lp64(memory), 4096, Address::new64(BASE), limits);
        assert!(matches!(obj.image(), Err(InspectError::Io(_))));
    }

    #[test]
    fn line_info_is_unavailable() {
        let (_, obj) = memory_object(image_bytes());
        assert!(!obj.has_debug_info());
        assert!(obj.line_number_for_pc(Address::new64(BASE + 0x100)).is_none());
    }

    #[test]
    fn demangles_closest_symbol() {
        let sym = ClosestSymbol {
            name: "_ZN8Universe14_collectedHeapE".to_string(),
            offset: 0,
        };
        assert_eq!(sym.demangled_name(), "Universe::_collectedHeap");
        assert_eq!(sym.to_string(), "_ZN8Universe14_collectedHeapE");
    }
}
