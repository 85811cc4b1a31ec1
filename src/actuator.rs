// actuator.rs

use embedded_hal::digital::OutputPin;

pub trait FanActuator {
    fn set_fan(&mut self, on: bool) -> anyhow::Result<()>;
}

/// Fan relay on a GPIO, active high.
pub struct RelayFan<P> {
    pin: P,
}

impl<P: OutputPin> RelayFan<P> {
    pub fn new(pin: P) -> Self {
        RelayFan { pin }
    }
}

impl<P: OutputPin> FanActuator for RelayFan<P> {
    fn set_fan(&mut self, on: bool) -> anyhow::Result<()> {
        let res = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        res.map_err(|e| anyhow::anyhow!("Relay pin error: {e:?}"))
    }
}


// EOF
