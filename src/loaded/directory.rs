//! The set of images mapped into one target.

use super::{ClosestSymbol, LoadedObject};
use crate::core::address::Address;
use crate::error::{InspectError, Result};
use crate::io::error::IoError;
use crate::io::IOLimits;
use crate::target::{maps, MappedRegion, Target};
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct ObjectDirectory {
    objects: Vec<LoadedObject>,
}

impl ObjectDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object, replacing and returning any object at the same base.
    pub fn insert(&mut self, object: LoadedObject) -> Option<LoadedObject> {
        match self.objects.iter().position(|o| *o == object) {
            Some(i) => Some(std::mem::replace(&mut self.objects[i], object)),
            None => {
                self.objects.push(object);
                None
            }
        }
    }

    pub fn objects(&self) -> &[LoadedObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Object whose name is `name`, or whose file name is `name`.
    pub fn by_name(&self, name: &str) -> Option<&LoadedObject> {
        self.objects.iter().find(|o| match o.name() {
            Some(full) => {
                full == name
                    || std::path::Path::new(full)
                        .file_name()
                        .is_some_and(|f| f == name)
            }
            None => false,
        })
    }

    pub fn by_base(&self, base: Address) -> Option<&LoadedObject> {
        self.objects.iter().find(|o| o.base() == base)
    }

    pub fn object_containing(&self, pc: Address) -> Option<&LoadedObject> {
        self.objects.iter().find(|o| o.contains(pc))
    }

    /// Address of `name` in the first object that defines it.
    ///
    /// Objects that fail to load are skipped. If no object defines the
    /// symbol and some object failed for a reason other than a malformed
    /// image, that first failure is returned.
    pub fn lookup_symbol(&self, name: &str) -> Result<Option<Address>> {
        let mut first_failure: Option<InspectError> = None;
        for object in &self.objects {
            match object.lookup_symbol(name) {
                Ok(Some(addr)) => return Ok(Some(addr)),
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        object = object.name().unwrap_or("<memory>"),
                        base = %object.base(),
                        error = %err,
                        "Skipping object during symbol lookup"
                    );
                    if !err.is_malformed() && first_failure.is_none() {
                        first_failure = Some(err);
                    }
                }
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }

    /// Closest symbol to `pc` in the object mapped over it.
    pub fn closest_symbol_to_pc(
        &self,
        pc: Address,
    ) -> Result<Option<(&LoadedObject, ClosestSymbol)>> {
        let Some(object) = self.object_containing(pc) else {
            return Ok(None);
        };
        Ok(object.closest_symbol_to_pc(pc)?.map(|sym| (object, sym)))
    }

    /// Move the object at `old_base` to `new_base`. Returns false when no
    /// object is loaded at `old_base`.
    pub fn rebase(&mut self, old_base: Address, new_base: Address) -> bool {
        match self.objects.iter_mut().find(|o| o.base() == old_base) {
            Some(object) => {
                object.set_base(new_base);
                true
            }
            None => false,
        }
    }

    /// One file-backed object per distinct path in `regions`.
    ///
    /// An object's base is where file offset 0 would be mapped, taken from
    /// the mapping with the lowest file offset. A listing that starts past
    /// the first segment still yields the image's real load address.
    pub fn from_regions(target: &Target, regions: &[MappedRegion], limits: &IOLimits) -> Result<Self> {
        struct Span {
            path: PathBuf,
            lowest_offset: u64,
            base: Option<u64>,
            end: u64,
        }

        // first-seen order
        let mut spans: Vec<Span> = Vec::new();
        for region in regions.iter().filter(|r| r.is_file_backed()) {
            let Some(path) = region.path.as_ref() else {
                continue;
            };
            let base = region.start.checked_sub(region.offset);
            match spans.iter_mut().find(|s| &s.path == path) {
                Some(span) => {
                    if region.offset < span.lowest_offset {
                        span.lowest_offset = region.offset;
                        span.base = base;
                    }
                    span.end = span.end.max(region.end);
                }
                None => spans.push(Span {
                    path: path.clone(),
                    lowest_offset: region.offset,
                    base,
                    end: region.end,
                }),
            }
        }

        let mut directory = Self::new();
        for span in spans {
            let Some(base) = span.base else {
                warn!(
                    path = %span.path.display(),
                    offset = span.lowest_offset,
                    "Mapping offset exceeds its start address; skipping object"
                );
                continue;
            };
            directory.insert(LoadedObject::from_file(
                target.clone(),
                span.path,
                span.end - base,
                target.address(base)?,
                limits.clone(),
            ));
        }
        debug!(objects = directory.len(), "Built object directory");
        Ok(directory)
    }

    /// Directory from the text of a `/proc/<pid>/maps` listing.
    pub fn from_maps(target: &Target, maps_text: &str, limits: &IOLimits) -> Result<Self> {
        Self::from_regions(target, &maps::parse_maps(maps_text), limits)
    }

    /// Directory from a live process's current mappings.
    pub fn from_pid(pid: u32, target: &Target, limits: &IOLimits) -> Result<Self> {
        let regions = maps::read_proc_maps(pid).map_err(|source| IoError::Open {
            path: PathBuf::from(format!("/proc/{}/maps", pid)),
            source,
        })?;
        Self::from_regions(target, &regions, limits)
    }
}
