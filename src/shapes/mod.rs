mod shape;
mod sphere;
mod box_shape;
mod capsule;
mod height_field;
mod compound;

pub use self::shape::ConvexShape;
pub use self::sphere::Sphere;
pub use self::box_shape::BoxShape;
pub use self::capsule::Capsule;
pub use self::height_field::{HeightField, TriangleIndex};
pub use self::compound::CompoundHierarchy;
