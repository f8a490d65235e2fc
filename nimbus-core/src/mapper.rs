//! Terminal normalization step: pure assembly of canonical aggregates from
//! already-unit-typed primitives. No source-specific types appear here.
//!
//! Every builder preserves per-field nullability (a `None` input means
//! "this source never supplied this metric") and collapses all-`None`
//! composites to absence so downstream code never sees a hollow object.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use std::collections::BTreeMap;

use crate::model::weather::{
    Astro, Base, Hourly, Normals, Precipitation, PrecipitationProbability, Temperature, Weather,
    Wind,
};
use crate::model::{AirQuality, HourlyWrapper, Pollen, WeatherWrapper};
use crate::units::Temperature as TemperatureValue;
use crate::units::{PollutantConcentration, Precipitation as PrecipitationValue, Ratio, Speed};

pub fn temperature(
    temperature: Option<TemperatureValue>,
    source_feels_like: Option<TemperatureValue>,
    apparent: Option<TemperatureValue>,
    wind_chill: Option<TemperatureValue>,
    wet_bulb: Option<TemperatureValue>,
) -> Option<Temperature> {
    let t = Temperature {
        temperature,
        source_feels_like,
        apparent,
        wind_chill,
        wet_bulb,
    };
    t.is_valid().then_some(t)
}

pub fn wind(direction: Option<f64>, speed: Option<Speed>, gusts: Option<Speed>) -> Option<Wind> {
    if direction.is_none() && speed.is_none() && gusts.is_none() {
        return None;
    }
    Some(Wind {
        direction,
        speed,
        gusts,
    })
}

pub fn precipitation(
    total: Option<PrecipitationValue>,
    thunderstorm: Option<PrecipitationValue>,
    rain: Option<PrecipitationValue>,
    snow: Option<PrecipitationValue>,
    ice: Option<PrecipitationValue>,
) -> Option<Precipitation> {
    if total.is_none()
        && thunderstorm.is_none()
        && rain.is_none()
        && snow.is_none()
        && ice.is_none()
    {
        return None;
    }
    Some(Precipitation {
        total,
        thunderstorm,
        rain,
        snow,
        ice,
    })
}

pub fn precipitation_probability(
    total: Option<Ratio>,
    thunderstorm: Option<Ratio>,
    rain: Option<Ratio>,
    snow: Option<Ratio>,
    ice: Option<Ratio>,
) -> Option<PrecipitationProbability> {
    if total.is_none()
        && thunderstorm.is_none()
        && rain.is_none()
        && snow.is_none()
        && ice.is_none()
    {
        return None;
    }
    Some(PrecipitationProbability {
        total,
        thunderstorm,
        rain,
        snow,
        ice,
    })
}

pub fn air_quality(
    pm25: Option<PollutantConcentration>,
    pm10: Option<PollutantConcentration>,
    so2: Option<PollutantConcentration>,
    no2: Option<PollutantConcentration>,
    o3: Option<PollutantConcentration>,
    co: Option<PollutantConcentration>,
) -> Option<AirQuality> {
    AirQuality {
        pm25,
        pm10,
        so2,
        no2,
        o3,
        co,
    }
    .validate()
}

#[allow(clippy::too_many_arguments)]
pub fn pollen(
    alder: Option<u32>,
    birch: Option<u32>,
    grass: Option<u32>,
    mugwort: Option<u32>,
    olive: Option<u32>,
    ragweed: Option<u32>,
    tree: Option<u32>,
    mold: Option<u32>,
) -> Option<Pollen> {
    Pollen {
        alder,
        birch,
        grass,
        mugwort,
        olive,
        ragweed,
        tree,
        mold,
    }
    .validate()
}

/// Single-entry month-keyed normals, so months fetched piecemeal across
/// refresh cycles can be merged without clobbering earlier months.
pub fn normals_for_month(
    month: u32,
    daytime_temperature: Option<TemperatureValue>,
    nighttime_temperature: Option<TemperatureValue>,
) -> BTreeMap<u32, Normals> {
    let normals = Normals {
        daytime_temperature,
        nighttime_temperature,
    };
    if normals.is_valid() && (1..=12).contains(&month) {
        BTreeMap::from([(month, normals)])
    } else {
        BTreeMap::new()
    }
}

/// Whether `time` falls in daylight. Uses the day's sun events when both
/// are known; otherwise falls back to 06:00-18:00 local time.
pub fn is_daylight(sun: Option<&Astro>, time: DateTime<Utc>, timezone: FixedOffset) -> bool {
    if let Some(astro) = sun
        && let (Some(rise), Some(set)) = (astro.rise_date, astro.set_date)
    {
        return rise <= time && time < set;
    }
    let local_hour = time.with_timezone(&timezone).hour();
    (6..18).contains(&local_hour)
}

/// Promote a converter-produced hourly record to the canonical `Hourly`,
/// computing the daylight flag once, consistently, at mapping time.
pub fn complete_hourly(wrapper: HourlyWrapper, sun: Option<&Astro>, timezone: FixedOffset) -> Hourly {
    Hourly {
        is_daylight: is_daylight(sun, wrapper.date, timezone),
        date: wrapper.date,
        weather_text: wrapper.weather_text,
        weather_code: wrapper.weather_code,
        temperature: wrapper.temperature,
        precipitation: wrapper.precipitation,
        precipitation_probability: wrapper.precipitation_probability,
        wind: wrapper.wind,
        air_quality: wrapper.air_quality,
        uv: wrapper.uv,
        relative_humidity: wrapper.relative_humidity,
        dew_point: wrapper.dew_point,
        pressure: wrapper.pressure,
        cloud_cover: wrapper.cloud_cover,
        visibility: wrapper.visibility,
    }
}

/// Promote a per-refresh wrapper into the final aggregate: daylight flags
/// are computed against each hour's own calendar day, and the
/// present-conditions air quality / pollen snapshots are merged into
/// `Current` and today's `Daily` when those don't already carry one.
pub fn assemble(wrapper: WeatherWrapper, base: Base, timezone: FixedOffset) -> Weather {
    let mut daily_forecast = wrapper.daily_forecast.unwrap_or_default();

    let hourly_forecast = wrapper
        .hourly_forecast
        .unwrap_or_default()
        .into_iter()
        .map(|hour| {
            let day = hour.date.with_timezone(&timezone).date_naive();
            let sun = daily_forecast
                .iter()
                .find(|d| d.date.with_timezone(&timezone).date_naive() == day)
                .and_then(|d| d.sun.as_ref());
            complete_hourly(hour, sun, timezone)
        })
        .collect();

    let mut current = wrapper.current;
    if let Some(air_quality) = wrapper.air_quality
        && let Some(current) = current.as_mut()
        && current.air_quality.is_none()
    {
        current.air_quality = Some(air_quality);
    }
    if let Some(pollen) = wrapper.pollen
        && let Some(today) = daily_forecast.first_mut()
        && today.pollen.is_none()
    {
        today.pollen = Some(pollen);
    }

    Weather {
        base,
        current,
        daily_forecast,
        hourly_forecast,
        minutely_forecast: wrapper.minutely_forecast.unwrap_or_default(),
        alert_list: wrapper.alert_list.unwrap_or_default(),
        normals: wrapper.normals.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn all_null_composites_collapse_to_absence() {
        assert!(temperature(None, None, None, None, None).is_none());
        assert!(wind(None, None, None).is_none());
        assert!(precipitation(None, None, None, None, None).is_none());
        assert!(air_quality(None, None, None, None, None, None).is_none());
        assert!(pollen(None, None, None, None, None, None, None, None).is_none());
    }

    #[test]
    fn partially_populated_composites_survive() {
        let w = wind(Some(270.0), None, None).unwrap();
        assert_eq!(w.direction, Some(270.0));
        assert!(w.speed.is_none());
    }

    #[test]
    fn normals_map_has_single_month_entry() {
        let normals = normals_for_month(3, TemperatureValue::celsius(12.0).ok(), None);
        assert_eq!(normals.len(), 1);
        assert!(normals.contains_key(&3));
        // Out-of-range months and all-null normals produce nothing.
        assert!(normals_for_month(13, TemperatureValue::celsius(1.0).ok(), None).is_empty());
        assert!(normals_for_month(3, None, None).is_empty());
    }

    #[test]
    fn daylight_uses_sun_events_when_known() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let sun = Astro {
            rise_date: Some(Utc.with_ymd_and_hms(2024, 6, 1, 4, 0, 0).unwrap()),
            set_date: Some(Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap()),
        };
        // 05:00 is before the 06:00 fallback would allow, but after sunrise.
        let early = Utc.with_ymd_and_hms(2024, 6, 1, 5, 0, 0).unwrap();
        assert!(is_daylight(Some(&sun), early, tz));
        let night = Utc.with_ymd_and_hms(2024, 6, 1, 21, 0, 0).unwrap();
        assert!(!is_daylight(Some(&sun), night, tz));
    }

    #[test]
    fn assemble_computes_daylight_per_calendar_day() {
        use crate::model::weather::Daily;

        let tz = FixedOffset::east_opt(0).unwrap();
        let day = Daily {
            date: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            sun: Some(Astro {
                rise_date: Some(Utc.with_ymd_and_hms(2024, 6, 1, 4, 0, 0).unwrap()),
                set_date: Some(Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap()),
            }),
            ..Default::default()
        };
        let wrapper = WeatherWrapper {
            daily_forecast: Some(vec![day]),
            hourly_forecast: Some(vec![
                HourlyWrapper {
                    date: Utc.with_ymd_and_hms(2024, 6, 1, 5, 0, 0).unwrap(),
                    ..Default::default()
                },
                HourlyWrapper {
                    date: Utc.with_ymd_and_hms(2024, 6, 1, 21, 0, 0).unwrap(),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };

        let weather = assemble(wrapper, Base::default(), tz);
        assert!(weather.hourly_forecast[0].is_daylight);
        assert!(!weather.hourly_forecast[1].is_daylight);
    }

    #[test]
    fn assemble_merges_air_quality_snapshot_into_current() {
        use crate::model::weather::Current;
        use crate::units::PollutantConcentration;

        let tz = FixedOffset::east_opt(0).unwrap();
        let snapshot = air_quality(
            PollutantConcentration::micrograms_per_cubic_meter(35.0).ok(),
            None,
            None,
            None,
            None,
            None,
        )
        .unwrap();
        let wrapper = WeatherWrapper {
            current: Some(Current::default()),
            air_quality: Some(snapshot.clone()),
            ..Default::default()
        };
        let weather = assemble(wrapper, Base::default(), tz);
        assert_eq!(weather.current.unwrap().air_quality, Some(snapshot.clone()));

        // A current that is absent has nowhere to merge into.
        let wrapper = WeatherWrapper {
            air_quality: Some(snapshot),
            ..Default::default()
        };
        let weather = assemble(wrapper, Base::default(), tz);
        assert!(weather.current.is_none());
    }

    #[test]
    fn daylight_falls_back_to_local_clock() {
        let tz = FixedOffset::east_opt(3600).unwrap();
        // 05:30 UTC is 06:30 local.
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 5, 30, 0).unwrap();
        assert!(is_daylight(None, t, tz));
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 22, 0, 0).unwrap();
        assert!(!is_daylight(None, t, tz));
    }
}
