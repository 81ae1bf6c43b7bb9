//! Heading sensor trait

/// Trait for heading (yaw) sensors
///
/// Headings are fixed-point tenths of a degree, wrapped to (-1800, 1800].
/// Counter-clockwise rotation increases the heading.
pub trait HeadingSensor {
    /// Refresh and return the current heading
    ///
    /// Takes `&mut self` because gyro-based sensors integrate on every read.
    fn heading_x10(&mut self) -> i32;

    /// Integrate without reading out
    ///
    /// Called between sleep slices of every blocking wait, so rotation
    /// done while nobody reads the heading is still accounted for.
    fn refresh(&mut self) {}
}
