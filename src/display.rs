// display.rs

use core::fmt::Write;

use heapless::String as HString;

use crate::*;

/// Characters per line on a 128 px wide OLED with the 6 px font.
pub const LINE_LEN: usize = 21;
pub const N_LINES: usize = 5;

pub type StatusLines = [HString<LINE_LEN>; N_LINES];

#[derive(Clone, Debug)]
pub struct StatusView {
    /// Station address while the link is up.
    pub ip: Option<net::Ipv4Addr>,
    pub concentration: f32,
    pub fan_on: bool,
    pub mode: FanMode,
}

impl StatusView {
    pub fn lines(&self) -> StatusLines {
        let mut lines: StatusLines = Default::default();
        // overflowing text is truncated by the fixed capacity
        let _ = write!(
            lines[0],
            "{} {} {}",
            if self.ip.is_some() { "WiFi" } else { "Off" },
            if self.mode.is_auto() { "AUTO" } else { "MAN" },
            if self.fan_on { "F_ON" } else { "F_OFF" },
        );
        let _ = write!(lines[1], "AQ: {:.0} PPM", self.concentration);
        let _ = write!(lines[2], "Fan: {}", if self.fan_on { "ON" } else { "OFF" });
        let _ = write!(
            lines[3],
            "Mode: {}",
            if self.mode.is_auto() { "AUTO" } else { "MANUAL" }
        );
        if let Some(ip) = self.ip {
            let _ = write!(lines[4], "IP: {ip}");
        }
        lines
    }
}

pub trait StatusDisplay {
    fn render(&mut self, status: &StatusView) -> anyhow::Result<()>;
}

/// Display sink that writes the status lines to the log.
#[derive(Default)]
pub struct LogDisplay {
    last: Option<StatusLines>,
}

impl StatusDisplay for LogDisplay {
    fn render(&mut self, status: &StatusView) -> anyhow::Result<()> {
        let lines = status.lines();
        if self.last.as_ref() != Some(&lines) {
            let text = lines.iter().map(|l| l.as_str()).collect::<Vec<_>>();
            info!("Status: {}", text.join(" | "));
            self.last = Some(lines);
        }
        Ok(())
    }
}


// EOF
