// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::items_after_statements)] // Test helpers
#![allow(clippy::module_name_repetitions)] // Test modules
#![allow(clippy::needless_pass_by_value)] // Test functions

//! End-to-end discovery and query tests against an in-process fixture
//! collector/schedd speaking the real wire protocol over TCP.

use gridq::{
    Ad, AdCategory, AdValue, ClientConfig, CollectorClient, Constraint, Error, PoolSelector,
    Projection, QueryRequest, QueryResponse, ScheddClient, ScheddLocation, ScheddLocator,
};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

/// Spawn a fixture daemon that answers every query on its socket with
/// `code` and the subset of `ads` matching the request's constraint
/// and projection. Returns the daemon's address.
fn spawn_daemon(code: i32, ads: Vec<Ad>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };

            let mut len_buf = [0u8; 4];
            if stream.read_exact(&mut len_buf).is_err() {
                continue;
            }
            let len = u32::from_be_bytes(len_buf) as usize;
            let mut body = vec![0u8; len];
            if stream.read_exact(&mut body).is_err() {
                continue;
            }
            let request: QueryRequest = serde_json::from_slice(&body).unwrap();

            let projection = Projection::new(request.projection.iter().cloned());
            let matching: Vec<Ad> = ads
                .iter()
                .filter(|ad| matches_constraint(ad, &request.constraint))
                .map(|ad| ad.project(&projection))
                .collect();

            let response = QueryResponse {
                code,
                ads: matching,
            };
            stream.write_all(&response.encode().unwrap()).unwrap();
        }
    });

    addr
}

/// Minimal server-side constraint evaluation for the fixture: literal
/// true, `Name == "x"` equality, and `Attr > 0` integer tests.
fn matches_constraint(ad: &Ad, constraint: &str) -> bool {
    if constraint == "true" {
        return true;
    }
    if let Some((attr, rest)) = constraint.split_once(" == ") {
        let wanted = rest.trim_matches('"');
        return ad.iter().any(|(name, value)| {
            name == attr && value.as_str() == Some(wanted)
        });
    }
    if let Some((attr, _)) = constraint.split_once(" > 0") {
        return matches!(ad.iter().find(|(name, _)| *name == attr.trim()),
            Some((_, AdValue::Integer(n))) if *n > 0);
    }
    false
}

fn schedd_ad(name: &str, address: &str, total_jobs: i64, max_running: i64) -> Ad {
    let mut ad = Ad::new();
    ad.insert("Name", AdValue::String(name.into()));
    ad.insert("Address", AdValue::String(address.into()));
    ad.insert("Machine", AdValue::String("node7.example.org".into()));
    ad.insert("DaemonVersion", AdValue::String("0.3".into()));
    ad.insert("TotalJobAds", AdValue::Integer(total_jobs));
    ad.insert("MaxJobsRunning", AdValue::Integer(max_running));
    ad
}

fn job_ad(cluster: i64, owner: &str) -> Ad {
    let mut ad = Ad::new();
    ad.insert("ClusterId", AdValue::Integer(cluster));
    ad.insert("Owner", AdValue::String(owner.into()));
    ad.insert("JobStatus", AdValue::Integer(2));
    ad
}

fn fast_config() -> ClientConfig {
    ClientConfig::default()
        .with_connect_timeout_secs(2)
        .with_read_timeout_secs(2)
}

/// A bound-then-dropped port: connecting to it is refused.
fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

#[test]
fn named_pool_query_returns_server_order() {
    let pool_a = spawn_daemon(
        0,
        vec![
            schedd_ad("sched1", "10.0.0.7:9615", 3, 100),
            schedd_ad("sched2", "10.0.0.8:9615", 1, 100),
            schedd_ad("idle", "10.0.0.9:9615", 0, 100),
        ],
    );
    let client = CollectorClient::new(fast_config()).unwrap();

    let constraint = Constraint::parse("TotalJobAds > 0").unwrap();
    let ads = client
        .query(
            AdCategory::Schedd,
            &PoolSelector::named(pool_a.as_str()),
            Some(&constraint),
            &Projection::all(),
        )
        .unwrap();

    assert_eq!(ads.len(), 2);
    assert_eq!(ads[0].get_str("Name"), Some("sched1"));
    assert_eq!(ads[1].get_str("Name"), Some("sched2"));
}

#[test]
fn projection_limits_returned_attributes() {
    let pool = spawn_daemon(0, vec![schedd_ad("sched1", "10.0.0.7:9615", 3, 100)]);
    let client = CollectorClient::new(fast_config()).unwrap();

    let ads = client
        .query(
            AdCategory::Schedd,
            &PoolSelector::named(pool.as_str()),
            None,
            &Projection::new(["Name", "Address"]),
        )
        .unwrap();

    assert_eq!(ads.len(), 1);
    let names: Vec<&str> = ads[0].iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["Name", "Address"]);
}

#[test]
fn default_pool_set_merges_in_configured_order() {
    let c1 = spawn_daemon(0, vec![schedd_ad("sched1", "10.0.0.7:9615", 1, 100)]);
    let c2 = spawn_daemon(0, vec![schedd_ad("sched2", "10.0.0.8:9615", 1, 100)]);

    let config = fast_config().with_collector(c1.as_str()).with_collector(c2.as_str());
    let client = CollectorClient::new(config).unwrap();

    let ads = client
        .query(
            AdCategory::Schedd,
            &PoolSelector::Default,
            None,
            &Projection::all(),
        )
        .unwrap();
    let names: Vec<_> = ads.iter().filter_map(|ad| ad.get_str("Name")).collect();
    assert_eq!(names, ["sched1", "sched2"]);
}

#[test]
fn unreachable_collector_in_default_set_fails_the_call() {
    let c1 = spawn_daemon(0, vec![schedd_ad("sched1", "10.0.0.7:9615", 1, 100)]);
    let config = fast_config().with_collector(c1.as_str()).with_collector(dead_address());
    let client = CollectorClient::new(config).unwrap();

    let err = client
        .query(
            AdCategory::Schedd,
            &PoolSelector::Default,
            None,
            &Projection::all(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Unreachable(_)));
}

#[test]
fn collector_reported_communication_failure_is_unreachable() {
    let pool = spawn_daemon(4, vec![]);
    let client = CollectorClient::new(fast_config()).unwrap();

    let err = client
        .query(
            AdCategory::Any,
            &PoolSelector::named(pool.as_str()),
            None,
            &Projection::all(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Unreachable(_)));
}

#[test]
fn two_phase_resolution_locates_then_queries_jobs() {
    // Phase two target first, so its live address can go into the ad.
    let schedd_addr = spawn_daemon(
        0,
        vec![job_ad(12, "astra"), job_ad(13, "astra"), job_ad(14, "brin")],
    );
    let pool = spawn_daemon(
        0,
        vec![schedd_ad("sched1@node7", &schedd_addr, 3, 100)],
    );

    let config = fast_config();
    let locator = ScheddLocator::new(CollectorClient::new(config.clone()).unwrap());
    let location = locator
        .locate_by_name(&PoolSelector::named(pool.as_str()), "sched1@node7")
        .unwrap();
    assert_eq!(location.address, schedd_addr);
    assert_eq!(location.hostname, "node7.example.org");
    assert_eq!(location.version, "0.3");

    let schedd = ScheddClient::new(&config, location).unwrap();
    let constraint = Constraint::attr_eq("Owner", "astra").unwrap();
    let jobs = schedd
        .query_jobs(Some(&constraint), &Projection::new(["ClusterId", "Owner"]))
        .unwrap();

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].get("ClusterId"), Some(&AdValue::Integer(12)));
    assert_eq!(jobs[1].get("ClusterId"), Some(&AdValue::Integer(13)));
}

#[test]
fn locate_all_on_pool_without_active_schedds_is_empty_not_error() {
    // One schedd ad, but with zero job-slot capacity.
    let pool = spawn_daemon(0, vec![schedd_ad("drained", "10.0.0.7:9615", 5, 0)]);
    let locator = ScheddLocator::new(CollectorClient::new(fast_config()).unwrap());

    let locations = locator.locate_all(&PoolSelector::named(pool.as_str())).unwrap();
    assert!(locations.is_empty());
}

#[test]
fn locate_by_name_with_addressless_ad_is_not_found() {
    let mut incomplete = Ad::new();
    incomplete.insert("Name", AdValue::String("sched1".into()));
    incomplete.insert("MaxJobsRunning", AdValue::Integer(100));
    let pool = spawn_daemon(0, vec![incomplete]);

    let locator = ScheddLocator::new(CollectorClient::new(fast_config()).unwrap());
    let err = locator
        .locate_by_name(&PoolSelector::named(pool.as_str()), "sched1")
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn empty_address_location_never_touches_the_network() {
    let location = ScheddLocation {
        address: String::new(),
        name: "sched1".into(),
        hostname: "node7".into(),
        version: String::new(),
    };
    let err = ScheddClient::new(&fast_config(), location).unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[test]
fn returned_ads_are_value_independent_copies() {
    let pool = spawn_daemon(0, vec![schedd_ad("sched1", "10.0.0.7:9615", 3, 100)]);
    let client = CollectorClient::new(fast_config()).unwrap();
    let query = |client: &CollectorClient| {
        client
            .query(
                AdCategory::Schedd,
                &PoolSelector::named(pool.as_str()),
                None,
                &Projection::all(),
            )
            .unwrap()
    };

    let mut first = query(&client);
    first[0].insert("Name", AdValue::String("tampered".into()));
    first[0].insert("Injected", AdValue::Bool(true));

    let second = query(&client);
    assert_eq!(second[0].get_str("Name"), Some("sched1"));
    assert_eq!(second[0].get("Injected"), None);
}
