// control.rs

use crate::*;

pub fn parse_threshold(s: &str) -> Result<u32, ControlError> {
    s.trim()
        .parse::<u32>()
        .map_err(|_| ControlError::BadThreshold(s.to_string()))
}

/// Local control operations. Each one takes the device lock once and is
/// visible to the next reader immediately.
impl MyState {
    pub async fn status(&self) -> AirStatus {
        AirStatus::from(&*self.device.read().await)
    }

    /// Manual override: sets the relay and leaves auto mode.
    pub async fn set_fan(&self, on: bool) {
        let changed = {
            let mut d = self.device.write().await;
            let changed = d.fan_on != on;
            d.fan_on = on;
            d.mode = FanMode::Manual;
            changed
        };
        if changed {
            self.fan_changed.notify_one();
        }
    }

    pub async fn set_mode(&self, mode: FanMode) {
        self.device.write().await.mode = mode;
    }

    pub async fn set_threshold(&self, threshold: u32) {
        self.device.write().await.threshold = threshold;
    }

    /// Validate both parameters before touching anything, then apply the fan
    /// override first and the mode second.
    pub async fn apply_control(
        &self,
        fan: Option<&str>,
        auto: Option<&str>,
    ) -> Result<(), ControlError> {
        let fan = fan.map(str::parse::<Switch>).transpose()?;
        let auto = auto.map(str::parse::<Switch>).transpose()?;

        if let Some(Switch(on)) = fan {
            self.set_fan(on).await;
        }
        if let Some(sw) = auto {
            self.set_mode(sw.into()).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> MyState {
        MyState::new(MyConfig::default())
    }

    #[tokio::test]
    async fn set_fan_forces_manual() {
        let st = state();
        for on in [true, false, true] {
            st.set_mode(FanMode::Auto).await;
            st.set_fan(on).await;
            let d = st.device.read().await;
            assert_eq!(d.fan_on, on);
            assert_eq!(d.mode, FanMode::Manual);
        }
    }

    #[tokio::test]
    async fn set_fan_twice_is_idempotent() {
        let st = state();
        st.set_fan(true).await;
        let first = st.status().await;
        st.set_fan(true).await;
        assert_eq!(st.status().await, first);
    }

    #[tokio::test]
    async fn set_mode_leaves_fan_alone() {
        let st = state();
        st.set_fan(true).await;
        st.set_mode(FanMode::Auto).await;
        let s = st.status().await;
        assert!(s.fan);
        assert_eq!(s.auto_mode, FanMode::Auto);
    }

    #[tokio::test]
    async fn bad_control_value_changes_nothing() {
        let st = state();
        let before = st.status().await;
        assert_eq!(
            st.apply_control(Some("on"), Some("maybe")).await,
            Err(ControlError::BadSwitch("maybe".into()))
        );
        assert_eq!(st.status().await, before);
    }

    #[tokio::test]
    async fn fan_then_mode() {
        let st = state();
        st.apply_control(Some("ON"), Some("on")).await.unwrap();
        let s = st.status().await;
        assert!(s.fan);
        assert_eq!(s.auto_mode, FanMode::Auto);
    }

    #[test]
    fn threshold_parsing() {
        assert_eq!(parse_threshold("450"), Ok(450));
        assert_eq!(parse_threshold(" 0 "), Ok(0));
        assert!(parse_threshold("-1").is_err());
        assert!(parse_threshold("abc").is_err());
        assert!(parse_threshold("").is_err());
    }
}

// EOF
