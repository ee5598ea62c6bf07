use base64::Engine as _;

/// One PNG-encoded screenshot plus the physical size of the captured screen.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub png: Vec<u8>,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl CapturedFrame {
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.png)
    }
}
