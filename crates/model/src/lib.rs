pub use serde_with;

pub mod coordinate;
pub mod leg;
pub mod place;
pub mod preferences;
pub mod waypoint;

pub trait ExampleData {
    fn example_data() -> Self;
}
