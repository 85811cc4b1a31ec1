// wifi.rs

use anyhow::bail;
use embedded_svc::wifi::{ClientConfiguration, Configuration};
use esp_idf_svc::{
    eventloop::{EspEventLoop, System},
    ipv4,
    netif::{self, EspNetif},
    timer::{EspTimerService, Task},
    wifi::{AsyncWifi, EspWifi, WifiDriver},
};

use crate::*;

const INITIAL_CONNECT_TIMEOUT: u64 = 30;

pub struct WifiLoop<'a> {
    pub state: Arc<MyState>,
    pub wifi: Option<AsyncWifi<EspWifi<'a>>>,
}

impl<'a> WifiLoop<'a> {
    pub async fn run(
        mut self,
        wifidriver: WifiDriver<'a>,
        sysloop: EspEventLoop<System>,
        timer: EspTimerService<Task>,
    ) -> anyhow::Result<()> {
        info!("Initializing Wi-Fi...");

        let net_if = EspNetif::new_with_conf(&netif::NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Client(
                ipv4::ClientConfiguration::DHCP(ipv4::DHCPClientSettings::default()),
            )),
            ..netif::NetifConfiguration::wifi_default_client()
        })?;

        if self.state.config.device_id.is_empty() {
            let mac = net_if.get_mac()?;
            *self.state.myid.write().await = format!(
                "airpurifier-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
                mac[0], mac[1], mac[2], mac[3], mac[4], mac[5],
            );
        }

        let espwifi = EspWifi::wrap_all(wifidriver, net_if, EspNetif::new(netif::NetifStack::Ap)?)?;
        self.wifi = Some(AsyncWifi::wrap(espwifi, sysloop, timer.clone())?);

        Box::pin(self.configure()).await?;

        if let Err(e) = Box::pin(self.do_connect_loop(true)).await {
            // local control keeps running, the loop below keeps retrying
            error!("WiFi connection failed: {e:?}");
        } else {
            self.link_up().await?;
        }

        self.stay_connected().await
    }

    pub async fn configure(&mut self) -> anyhow::Result<()> {
        info!("WiFi setting credentials...");
        let Some(wifi) = self.wifi.as_mut() else {
            bail!("WiFi not initialized");
        };
        let ssid = self.state.config.wifi_ssid.as_str();
        let pass = self.state.config.wifi_pass.as_str();
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| anyhow::anyhow!("SSID too long"))?,
            password: pass.try_into().map_err(|_| anyhow::anyhow!("Password too long"))?,
            ..Default::default()
        }))?;

        info!("WiFi driver starting...");
        Ok(Box::pin(wifi.start()).await?)
    }

    async fn link_up(&mut self) -> anyhow::Result<()> {
        let Some(wifi) = self.wifi.as_ref() else {
            bail!("WiFi not initialized");
        };
        let ip_info = wifi.wifi().sta_netif().get_ip_info()?;
        info!("WiFi connected, IP {}", ip_info.ip);
        *self.state.ip_addr.write().await = ip_info.ip;
        *self.state.wifi_up.write().await = true;
        Ok(())
    }

    pub async fn stay_connected(mut self) -> anyhow::Result<()> {
        loop {
            {
                let Some(wifi) = self.wifi.as_mut() else {
                    bail!("WiFi not initialized");
                };
                // returns once the link is gone
                Box::pin(wifi.wifi_wait(|w| w.is_up(), None)).await.ok();
            }
            if *self.state.wifi_up.read().await {
                warn!("WiFi link lost.");
                *self.state.wifi_up.write().await = false;
            }
            if self.do_connect_loop(false).await.is_ok() {
                self.link_up().await?;
            }
        }
    }

    async fn do_connect_loop(&mut self, initial: bool) -> anyhow::Result<()> {
        let Some(wifi) = self.wifi.as_mut() else {
            bail!("WiFi not initialized");
        };

        let timeout = if initial {
            Some(Duration::from_secs(INITIAL_CONNECT_TIMEOUT))
        } else {
            None
        };

        info!("WiFi connecting...");
        if let Err(e) = Box::pin(wifi.connect()).await {
            error!("WiFi connect error: {e:?}");
            if initial {
                bail!(e);
            }
            sleep(Duration::from_secs(5)).await;
            bail!("WiFi connect retry");
        }

        info!("WiFi waiting for association...");
        match Box::pin(wifi.ip_wait_while(|w| w.is_up().map(|s| !s), timeout)).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("WiFi error: {e:?}");
                bail!(e);
            }
        }
    }
}

// EOF
