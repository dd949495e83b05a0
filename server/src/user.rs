/// Opaque handle for one connected client. Allocated by the server when the
/// transport hands over an accepted connection, never reused within a
/// process.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct UserKey(u64);

impl UserKey {
    pub fn to_u64(&self) -> u64 {
        self.0
    }

    pub fn from_u64(value: u64) -> Self {
        UserKey(value)
    }
}
