use super::packet::CompositeData;

/// Events that can be emitted by the VN-100 driver
#[derive(Clone, Debug)]
pub enum Event {
    /// A full async measurement packet was received from the sensor
    Composite(CompositeData),
    /// A packet was received but failed validation and was dropped
    BadPacket,
}
