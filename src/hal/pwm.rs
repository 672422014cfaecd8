//! LEDC PWM output for the four motor windings.
//!
//! One low-speed timer at the 20 kHz carrier, four active-high channels
//! bound to fixed pins at boot. The raw `ledc_*` calls are used instead
//! of the driver structs so the channel writer carries no lifetimes and
//! can live inside the sequencer task.

use esp_idf_svc::sys as esp_idf_sys;
use esp_idf_svc::sys::{esp, EspError};

use crate::config::{PWM_CARRIER_HZ, PWM_MAX_DUTY};
use crate::stepper::PwmSink;

const SPEED_MODE: esp_idf_sys::ledc_mode_t = esp_idf_sys::ledc_mode_t_LEDC_LOW_SPEED_MODE;

const CHANNELS: [esp_idf_sys::ledc_channel_t; 4] = [
    esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_0,
    esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_1,
    esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_2,
    esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_3,
];

/// LEDC duty ceiling at 7-bit resolution.
const LEDC_MAX_DUTY: u32 = (1 << 7) - 1;

/// Configure the carrier timer and the four channels, all at duty 0.
/// Called once at boot, before the sequencer task starts.
pub fn configure(pins: &[i32; 4]) -> Result<(), EspError> {
    let timer_cfg = esp_idf_sys::ledc_timer_config_t {
        speed_mode: SPEED_MODE,
        duty_resolution: esp_idf_sys::ledc_timer_bit_t_LEDC_TIMER_7_BIT,
        timer_num: esp_idf_sys::ledc_timer_t_LEDC_TIMER_0,
        freq_hz: PWM_CARRIER_HZ,
        clk_cfg: esp_idf_sys::ledc_clk_cfg_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    esp!(unsafe { esp_idf_sys::ledc_timer_config(&timer_cfg) })?;

    for (channel, pin) in CHANNELS.iter().zip(pins) {
        let channel_cfg = esp_idf_sys::ledc_channel_config_t {
            gpio_num: *pin,
            speed_mode: SPEED_MODE,
            channel: *channel,
            intr_type: esp_idf_sys::ledc_intr_type_t_LEDC_INTR_DISABLE,
            timer_sel: esp_idf_sys::ledc_timer_t_LEDC_TIMER_0,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        esp!(unsafe { esp_idf_sys::ledc_channel_config(&channel_cfg) })?;
    }

    Ok(())
}

/// Writer over the configured channels. Held by the sequencer task
/// alone (single-writer policy).
pub struct LedcPwm(());

impl LedcPwm {
    /// Requires [`configure`] to have run.
    pub fn writer() -> Self {
        Self(())
    }
}

impl PwmSink for LedcPwm {
    fn set_duty(&mut self, channel: usize, duty: u32) {
        let Some(&ch) = CHANNELS.get(channel) else {
            return;
        };
        // Scale the 0..=128 drive range onto the 7-bit LEDC range.
        let scaled = duty.min(PWM_MAX_DUTY) * LEDC_MAX_DUTY / PWM_MAX_DUTY;
        unsafe {
            esp_idf_sys::ledc_set_duty(SPEED_MODE, ch, scaled);
            esp_idf_sys::ledc_update_duty(SPEED_MODE, ch);
        }
    }
}
