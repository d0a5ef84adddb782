//! Triplets: typed key/value extension blocks attached to structured
//! fields. Each triplet is a length byte (counting itself), an identifier
//! byte and a payload.

use crate::encoding;

/// Fully qualified name types.
pub mod fqn_type {
    /// Replace the first GID name of the object.
    pub const REPLACE_FIRST_GID: u8 = 0x01;
    /// Attribute GID (tag logical elements).
    pub const ATTRIBUTE_GID: u8 = 0x0B;
    /// Begin document reference.
    pub const BEGIN_DOCUMENT_REF: u8 = 0x0F;
    /// External resource reference of a data object.
    pub const DATA_OBJECT_EXTERNAL_RESOURCE_REF: u8 = 0x84;
    /// Code page name reference (map coded font).
    pub const CODE_PAGE_NAME_REF: u8 = 0x85;
    /// Font character set name reference (map coded font).
    pub const FONT_CHARSET_NAME_REF: u8 = 0x8C;
}

/// Fully qualified name formats.
pub mod fqn_format {
    /// Character string.
    pub const CHARSTR: u8 = 0x00;
    /// ASN.1 object identifier.
    pub const OID: u8 = 0x10;
    /// Uniform resource locator.
    pub const URL: u8 = 0x20;
}

/// Mapping options for include-object placement.
pub mod mapping {
    pub const POSITION: u8 = 0x00;
    pub const POSITION_AND_TRIM: u8 = 0x10;
    pub const SCALE_TO_FIT: u8 = 0x20;
    pub const CENTER_AND_TRIM: u8 = 0x30;
    pub const SCALE_TO_FILL: u8 = 0x60;
}

/// Object classification structure flags: the container holds both the
/// object container structure and the object data.
pub const STRUCFLGS_CONTAINER_AND_DATA: u16 = 0xA800;
/// Structure flags for a container whose data rides outside the OCD
/// fields.
pub const STRUCFLGS_CONTAINER_ONLY: u16 = 0x8800;

/// A structured field triplet.
#[derive(Debug, Clone, PartialEq)]
pub enum Triplet {
    /// X'02': fully qualified name.
    FullyQualifiedName {
        fqn_type: u8,
        format: u8,
        name: String,
    },
    /// X'04': mapping option.
    MappingOption { option: u8 },
    /// X'10': object classification (registered object id and type name).
    ObjectClassification {
        class: u8,
        strucflags: u16,
        object_id: Vec<u8>,
        object_type_name: String,
    },
    /// X'21': resource object type.
    ResourceObjectType { object_type: u8 },
    /// X'24': resource local identifier.
    ResourceLocalId { resource_type: u8, id: u8 },
    /// X'36': attribute value.
    AttributeValue { value: String },
    /// X'4B': measurement units (logical units per unit base).
    MeasurementUnits { x_units: u16, y_units: u16 },
    /// X'4C': object area size.
    ObjectAreaSize { width: i32, height: i32 },
    /// X'50': encoding scheme identifier (CCSID).
    Encoding { ccsid: u16 },
}

impl Triplet {
    /// Identifier byte of this triplet.
    pub fn id(&self) -> u8 {
        match self {
            Triplet::FullyQualifiedName { .. } => 0x02,
            Triplet::MappingOption { .. } => 0x04,
            Triplet::ObjectClassification { .. } => 0x10,
            Triplet::ResourceObjectType { .. } => 0x21,
            Triplet::ResourceLocalId { .. } => 0x24,
            Triplet::AttributeValue { .. } => 0x36,
            Triplet::MeasurementUnits { .. } => 0x4B,
            Triplet::ObjectAreaSize { .. } => 0x4C,
            Triplet::Encoding { .. } => 0x50,
        }
    }

    /// Append the serialized triplet to `data`.
    pub fn append_to(&self, data: &mut Vec<u8>) {
        let payload = self.payload();
        data.push((2 + payload.len()) as u8);
        data.push(self.id());
        data.extend_from_slice(&payload);
    }

    fn payload(&self) -> Vec<u8> {
        let mut p = Vec::new();
        match self {
            Triplet::FullyQualifiedName { fqn_type, format, name } => {
                p.push(*fqn_type);
                p.push(*format);
                p.extend_from_slice(&encoding::encode_ebcdic(name));
            },
            Triplet::MappingOption { option } => {
                p.push(*option);
            },
            Triplet::ObjectClassification {
                class,
                strucflags,
                object_id,
                object_type_name,
            } => {
                p.push(*class);
                p.extend_from_slice(&[0x00, 0x00]); // reserved
                p.push((strucflags >> 8) as u8);
                p.push((strucflags & 0xFF) as u8);
                // registered object id, padded to 16 bytes
                let mut oid = [0u8; 16];
                let n = object_id.len().min(16);
                oid[..n].copy_from_slice(&object_id[..n]);
                p.extend_from_slice(&oid);
                // object type name, EBCDIC, space-padded to 32 bytes
                let mut name = [encoding::EBCDIC_SPACE; 32];
                for (slot, ch) in name.iter_mut().zip(object_type_name.chars()) {
                    *slot = encoding::encode_char(ch);
                }
                p.extend_from_slice(&name);
            },
            Triplet::ResourceObjectType { object_type } => {
                p.push(*object_type);
                p.push(0x00); // reserved
            },
            Triplet::ResourceLocalId { resource_type, id } => {
                p.push(*resource_type);
                p.push(*id);
            },
            Triplet::AttributeValue { value } => {
                p.extend_from_slice(&[0x00, 0x00]); // reserved
                p.extend_from_slice(&encoding::encode_ebcdic(value));
            },
            Triplet::MeasurementUnits { x_units, y_units } => {
                p.push(0x00); // XoaBase: ten inches
                p.push(0x00); // YoaBase: ten inches
                p.push((x_units >> 8) as u8);
                p.push((x_units & 0xFF) as u8);
                p.push((y_units >> 8) as u8);
                p.push((y_units & 0xFF) as u8);
            },
            Triplet::ObjectAreaSize { width, height } => {
                p.push(0x02); // size type: extents
                crate::modca::field::put_u24(&mut p, *width);
                crate::modca::field::put_u24(&mut p, *height);
            },
            Triplet::Encoding { ccsid } => {
                p.extend_from_slice(&[0x00, 0x00]); // reserved
                p.push((ccsid >> 8) as u8);
                p.push((ccsid & 0xFF) as u8);
            },
        }
        p
    }
}

/// Append a run of triplets to `data`.
pub fn append_all(triplets: &[Triplet], data: &mut Vec<u8>) {
    for triplet in triplets {
        triplet.append_to(data);
    }
}
