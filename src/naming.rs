//! Unique name generation for structured objects.
//!
//! Every named MO:DCA object carries a fixed-width identifier made of a
//! short kind prefix and a zero-padded, monotonically increasing counter
//! (`PGN00001`, `IMG00007`, `RG000002`, ...). One `NameFactory` instance
//! serializes one document; names are unique per kind for its lifetime.

/// Generates unique fixed-width names, one counter per object kind.
#[derive(Debug, Default)]
pub struct NameFactory {
    page_count: u32,
    page_group_count: u32,
    overlay_count: u32,
    document_count: u32,
    image_count: u32,
    graphic_count: u32,
    object_container_count: u32,
    resource_count: u32,
    resource_group_count: u32,
    text_object_count: u32,
    active_environment_group_count: u32,
    object_environment_group_count: u32,
    image_segment_count: u32,
}

fn next(prefix: &str, width: usize, counter: &mut u32) -> String {
    *counter += 1;
    format!("{}{:0width$}", prefix, *counter, width = width)
}

impl NameFactory {
    /// Create a new name factory with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for a page object, e.g. `PGN00001`.
    pub fn page_name(&mut self) -> String {
        next("PGN", 5, &mut self.page_count)
    }

    /// Name for a page group, e.g. `PGP00001`.
    pub fn page_group_name(&mut self) -> String {
        next("PGP", 5, &mut self.page_group_count)
    }

    /// Name for an overlay, e.g. `OVL00001`.
    pub fn overlay_name(&mut self) -> String {
        next("OVL", 5, &mut self.overlay_count)
    }

    /// Name for a document, e.g. `DOC00001`.
    pub fn document_name(&mut self) -> String {
        next("DOC", 5, &mut self.document_count)
    }

    /// Name for an IOCA image object, e.g. `IMG00001`.
    pub fn image_name(&mut self) -> String {
        next("IMG", 5, &mut self.image_count)
    }

    /// Name for a GOCA graphics object, e.g. `GRA00001`.
    pub fn graphics_name(&mut self) -> String {
        next("GRA", 5, &mut self.graphic_count)
    }

    /// Name for an object container, e.g. `OC000001`.
    pub fn object_container_name(&mut self) -> String {
        next("OC", 6, &mut self.object_container_count)
    }

    /// Name for a resource object, e.g. `RES00001`.
    pub fn resource_name(&mut self) -> String {
        next("RES", 5, &mut self.resource_count)
    }

    /// Name for a resource group, e.g. `RG000001`.
    pub fn resource_group_name(&mut self) -> String {
        next("RG", 6, &mut self.resource_group_count)
    }

    /// Name for a presentation text object, e.g. `PT000001`.
    pub fn text_object_name(&mut self) -> String {
        next("PT", 6, &mut self.text_object_count)
    }

    /// Name for an active environment group, e.g. `AEG00001`.
    pub fn active_environment_group_name(&mut self) -> String {
        next("AEG", 5, &mut self.active_environment_group_count)
    }

    /// Name for an object environment group, e.g. `OEG00001`.
    pub fn object_environment_group_name(&mut self) -> String {
        next("OEG", 5, &mut self.object_environment_group_count)
    }

    /// Name for an IOCA image segment, e.g. `IS01`.
    pub fn image_segment_name(&mut self) -> String {
        next("IS", 2, &mut self.image_segment_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_fixed_width_and_sequential() {
        let mut names = NameFactory::new();
        assert_eq!(names.page_name(), "PGN00001");
        assert_eq!(names.page_name(), "PGN00002");
        assert_eq!(names.image_name(), "IMG00001");
        assert_eq!(names.object_container_name(), "OC000001");
        assert_eq!(names.resource_group_name(), "RG000001");
        assert_eq!(names.text_object_name(), "PT000001");
        assert_eq!(names.image_segment_name(), "IS01");
    }

    #[test]
    fn test_counters_are_independent_per_kind() {
        let mut names = NameFactory::new();
        names.page_name();
        names.page_name();
        names.page_name();
        assert_eq!(names.overlay_name(), "OVL00001");
        assert_eq!(names.document_name(), "DOC00001");
    }
}
