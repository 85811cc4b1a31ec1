// measure.rs

/// Full scale of the 12-bit ADC.
pub const ADC_MAX: u16 = 4095;
/// Concentration reported at ADC full scale.
pub const PPM_MAX: f32 = 1000.0;

/// Anything that can produce a gas concentration reading on demand.
pub trait ReadingSource {
    fn read(&mut self) -> anyhow::Result<f32>;
}

/// Linear ADC count to PPM mapping. Uncalibrated.
pub fn raw_to_ppm(raw: u16) -> f32 {
    let raw = raw.min(ADC_MAX);
    raw as f32 * PPM_MAX / ADC_MAX as f32
}

/// Reading source over a raw ADC sampling closure.
pub struct AdcSource<F> {
    sample: F,
}

impl<F> AdcSource<F>
where
    F: FnMut() -> anyhow::Result<u16>,
{
    pub fn new(sample: F) -> Self {
        AdcSource { sample }
    }
}

impl<F> ReadingSource for AdcSource<F>
where
    F: FnMut() -> anyhow::Result<u16>,
{
    fn read(&mut self) -> anyhow::Result<f32> {
        let raw = (self.sample)()?;
        Ok(raw_to_ppm(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_full_adc_range() {
        assert_eq!(raw_to_ppm(0), 0.0);
        assert_eq!(raw_to_ppm(ADC_MAX), PPM_MAX);
        assert!((raw_to_ppm(2048) - 500.1).abs() < 0.1);
        // clamps garbage above 12 bits
        assert_eq!(raw_to_ppm(u16::MAX), PPM_MAX);
    }

    #[test]
    fn adc_errors_propagate() {
        let mut src = AdcSource::new(|| anyhow::bail!("adc timeout"));
        assert!(src.read().is_err());

        let mut src = AdcSource::new(|| Ok(ADC_MAX));
        assert_eq!(src.read().unwrap(), PPM_MAX);
    }
}

// EOF
