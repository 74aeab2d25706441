use std::io;

/// Raw HID feature-report access to the bridge.
///
/// Buffers follow the hidraw convention: byte 0 is the report id, the
/// payload starts at byte 1.
pub trait FeatureTransport: Send {
    fn set_feature(&mut self, report: &[u8]) -> io::Result<()>;

    /// Reads a feature report into `buf`. `buf[0]` carries the report id on
    /// entry. Returns the number of bytes read, report id included.
    fn get_feature(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: FeatureTransport + ?Sized> FeatureTransport for Box<T> {
    fn set_feature(&mut self, report: &[u8]) -> io::Result<()> {
        (**self).set_feature(report)
    }

    fn get_feature(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).get_feature(buf)
    }
}
