use crate::api::{attendance, dashboard, employee, export};
use crate::config::Config;
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Result, anyhow};

type Quota = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP quotas for the kiosk scan endpoint and the rest of the API.
#[derive(Clone)]
pub struct RateLimits {
    scan: Quota,
    api: Quota,
}

fn build_quota(requests_per_min: u32) -> Result<Quota> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min} requests per minute"))
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            scan: build_quota(config.rate_scan_per_min)?,
            api: build_quota(config.rate_api_per_min)?,
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, limits: &RateLimits, api_prefix: &str) {
    cfg.service(
        web::scope(api_prefix)
            .wrap(Governor::new(&limits.api))
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{employee_id}
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance, hit by the kiosk on every scan
                    .service(
                        web::resource("")
                            .wrap(Governor::new(&limits.scan))
                            .route(web::post().to(attendance::record_attendance)),
                    )
                    // /attendance/today
                    .service(
                        web::resource("/today").route(web::get().to(attendance::today_attendance)),
                    ),
            )
            .service(web::resource("/schedule").route(web::get().to(attendance::get_schedule)))
            .service(web::resource("/dashboard").route(web::get().to(dashboard::get_dashboard)))
            .service(
                web::scope("/export")
                    .service(
                        web::resource("/attendance")
                            .route(web::get().to(export::export_attendance)),
                    )
                    .service(
                        web::resource("/employees").route(web::get().to(export::export_employees)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quota_is_clamped_instead_of_failing() {
        let config = Config {
            rate_scan_per_min: 0,
            rate_api_per_min: 120_000,
            ..Config::default()
        };
        assert!(RateLimits::from_config(&config).is_ok());
    }
}
