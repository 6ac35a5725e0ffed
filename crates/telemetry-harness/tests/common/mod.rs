//! Shared composite types used across the integration scenarios (spec §8
//! "Concrete scenarios" 4-6).

use telemetry_core::custom_types::{CustomType, FieldKind, FieldSchema};
use telemetry_core::BasicType;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CustomType for Point3D {
    fn type_name() -> &'static str {
        "Point3D"
    }

    fn field_schemas() -> Vec<FieldSchema> {
        vec![
            FieldSchema { name: "x", kind: FieldKind::Numeric(BasicType::Float64), is_vector: false, array_size: 0 },
            FieldSchema { name: "y", kind: FieldKind::Numeric(BasicType::Float64), is_vector: false, array_size: 0 },
            FieldSchema { name: "z", kind: FieldKind::Numeric(BasicType::Float64), is_vector: false, array_size: 0 },
        ]
    }

    fn serialize_into(&self, dest: &mut &mut [u8]) {
        write_f64s(dest, &[self.x, self.y, self.z]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CustomType for Quaternion {
    fn type_name() -> &'static str {
        "Quaternion"
    }

    fn field_schemas() -> Vec<FieldSchema> {
        vec![
            FieldSchema { name: "w", kind: FieldKind::Numeric(BasicType::Float64), is_vector: false, array_size: 0 },
            FieldSchema { name: "x", kind: FieldKind::Numeric(BasicType::Float64), is_vector: false, array_size: 0 },
            FieldSchema { name: "y", kind: FieldKind::Numeric(BasicType::Float64), is_vector: false, array_size: 0 },
            FieldSchema { name: "z", kind: FieldKind::Numeric(BasicType::Float64), is_vector: false, array_size: 0 },
        ]
    }

    fn serialize_into(&self, dest: &mut &mut [u8]) {
        write_f64s(dest, &[self.w, self.x, self.y, self.z]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point3D,
    pub rotation: Quaternion,
}

impl CustomType for Pose {
    fn type_name() -> &'static str {
        "Pose"
    }

    fn field_schemas() -> Vec<FieldSchema> {
        vec![
            FieldSchema {
                name: "position",
                kind: FieldKind::Custom {
                    type_name: Point3D::type_name(),
                    is_fixed_size: || true,
                    fixed_size: || 24,
                    field_schemas: Point3D::field_schemas,
                },
                is_vector: false,
                array_size: 0,
            },
            FieldSchema {
                name: "rotation",
                kind: FieldKind::Custom {
                    type_name: Quaternion::type_name(),
                    is_fixed_size: || true,
                    fixed_size: || 32,
                    field_schemas: Quaternion::field_schemas,
                },
                is_vector: false,
                array_size: 0,
            },
        ]
    }

    fn serialize_into(&self, dest: &mut &mut [u8]) {
        self.position.serialize_into(dest);
        self.rotation.serialize_into(dest);
    }
}

fn write_f64s(dest: &mut &mut [u8], values: &[f64]) {
    for v in values {
        let bytes = v.to_le_bytes();
        let (head, tail) = std::mem::take(dest).split_at_mut(8);
        head.copy_from_slice(&bytes);
        *dest = tail;
    }
}

/// Spec §8 scenario 4's top-level composite: a mix of plain scalars, a
/// dynamic vector of one composite, and a fixed array of another.
#[derive(Debug, Clone)]
pub struct TestType {
    pub timestamp: f64,
    pub count: i32,
    pub positions: Vec<Point3D>,
    pub poses: [Pose; 3],
    pub color: u8,
}

impl CustomType for TestType {
    fn type_name() -> &'static str {
        "TestType"
    }

    fn field_schemas() -> Vec<FieldSchema> {
        vec![
            FieldSchema { name: "timestamp", kind: FieldKind::Numeric(BasicType::Float64), is_vector: false, array_size: 0 },
            FieldSchema { name: "count", kind: FieldKind::Numeric(BasicType::Int32), is_vector: false, array_size: 0 },
            FieldSchema {
                name: "positions",
                kind: FieldKind::Custom {
                    type_name: Point3D::type_name(),
                    is_fixed_size: || true,
                    fixed_size: || 24,
                    field_schemas: Point3D::field_schemas,
                },
                is_vector: true,
                array_size: 0,
            },
            FieldSchema {
                name: "poses",
                kind: FieldKind::Custom {
                    type_name: Pose::type_name(),
                    is_fixed_size: || true,
                    fixed_size: || 56,
                    field_schemas: Pose::field_schemas,
                },
                is_vector: true,
                array_size: 3,
            },
            FieldSchema { name: "color", kind: FieldKind::Numeric(BasicType::Uint8), is_vector: false, array_size: 0 },
        ]
    }

    fn serialize_into(&self, dest: &mut &mut [u8]) {
        write_f64s(dest, &[self.timestamp]);
        let count_bytes = self.count.to_le_bytes();
        let (head, tail) = std::mem::take(dest).split_at_mut(4);
        head.copy_from_slice(&count_bytes);
        *dest = tail;

        let len_bytes = (self.positions.len() as u32).to_le_bytes();
        let (head, tail) = std::mem::take(dest).split_at_mut(4);
        head.copy_from_slice(&len_bytes);
        *dest = tail;
        for p in &self.positions {
            p.serialize_into(dest);
        }
        for p in &self.poses {
            p.serialize_into(dest);
        }

        let (head, tail) = std::mem::take(dest).split_at_mut(1);
        head[0] = self.color;
        *dest = tail;
    }

    fn instance_size(&self) -> usize {
        8 + 4 + 4 + self.positions.len() * 24 + self.poses.len() * 56 + 1
    }
}
