//! Lumped-model de-embedding tests
//!
//! Pads, access lines and a 1 nH series inductor DUT, embedded in closed
//! form so every algorithm can be checked against the exact DUT.

mod common;

use approx::assert_relative_eq;
use common::*;
use skrf_deembed::math::transforms::{abcd_series, abcd_shunt};
use skrf_deembed::math::Mat2;
use skrf_deembed::{
    AdmittanceCancel, DeembedError, Deembedding, ImpedanceCancel, Network, Open, OpenShort, Short,
    ShortOpen, SplitPi, SplitTee,
};

fn inv(m: Mat2) -> Mat2 {
    m.inverse(1e-30).unwrap()
}

/// Pads outside, access lines inside: open, short, raw
fn open_short_set() -> (Network, Network, Network) {
    let freq = lumped_grid();
    let open = from_y(&freq, y_pads).named("open");
    let short = from_y(&freq, |f| {
        let yl = c(1.0, 0.0) / z_line(f);
        y_pads(f) + Mat2::diag(yl, yl)
    })
    .named("short");
    let raw = from_y(&freq, |f| {
        y_pads(f) + y_series(z_line(f) + z_dut(f) + z_line(f))
    })
    .named("raw");
    (open, short, raw)
}

/// Access lines outside, pads inside: short, open, raw
fn short_open_set() -> (Network, Network, Network) {
    let freq = lumped_grid();
    let lines = |f: f64| Mat2::diag(z_line(f), z_line(f));
    let short = from_z(&freq, lines);
    let open = from_z(&freq, |f| lines(f) + inv(y_pads(f)));
    let raw = from_z(&freq, |f| lines(f) + inv(y_pads(f) + y_series(z_dut(f))));
    (short, open, raw)
}

fn expected_dut() -> Network {
    from_abcd(&lumped_grid(), |f| abcd_series(z_dut(f)))
}

fn inductance(ntwk: &Network) -> Vec<f64> {
    let y = ntwk.y().unwrap();
    ntwk.f()
        .iter()
        .enumerate()
        .map(|(k, &f)| (c(1.0, 0.0) / y[[k, 0, 0]]).im / omega(f))
        .collect()
}

#[test]
fn test_open_short_recovers_inductor() {
    let (open, short, raw) = open_short_set();
    let dm = OpenShort::new(&open, &short).unwrap();
    let dut = dm.deembed(&raw).unwrap();

    for l in inductance(&dut) {
        assert_relative_eq!(l, L_DUT, max_relative = 1e-3);
    }
    assert_networks_close(&dut, &expected_dut(), 1e-8);
}

#[test]
fn test_open_leaves_line_resistance() {
    let (open, _, raw) = open_short_set();
    let dut = Open::new(&open).unwrap().deembed(&raw).unwrap();
    let y = dut.y().unwrap();

    for (k, &f) in dut.f().iter().enumerate() {
        let z = c(1.0, 0.0) / y[[k, 0, 0]];
        assert_relative_eq!(z.re, 2.0 * R_LINE, max_relative = 1e-6);
        assert_relative_eq!(z.im / omega(f), L_DUT, max_relative = 1e-6);
    }
}

#[test]
fn test_open_then_short_matches_open_short() {
    let (open, short, raw) = open_short_set();
    let open_dm = Open::new(&open).unwrap();

    let short_without_pads = open_dm.deembed(&short).unwrap();
    let two_step = Short::new(&short_without_pads)
        .unwrap()
        .deembed(&open_dm.deembed(&raw).unwrap())
        .unwrap();
    let one_step = OpenShort::new(&open, &short).unwrap().deembed(&raw).unwrap();

    assert_networks_close(&two_step, &one_step, 1e-9);
}

#[test]
fn test_short_open_recovers_inductor() {
    let (short, open, raw) = short_open_set();
    let dut = ShortOpen::new(&short, &open).unwrap().deembed(&raw).unwrap();

    for l in inductance(&dut) {
        assert_relative_eq!(l, L_DUT, max_relative = 1e-3);
    }
    assert_networks_close(&dut, &expected_dut(), 1e-8);
}

#[test]
fn test_split_pi() {
    let freq = lumped_grid();
    let pad = |f: f64| abcd_shunt(c(0.0, omega(f) * C_PAD));
    let half_line = |f: f64| abcd_series(c(R_LINE / 2.0, omega(f) * 20e-12));

    let thru = from_abcd(&freq, |f| pad(f) * half_line(f) * half_line(f) * pad(f));
    let raw = from_abcd(&freq, |f| {
        pad(f) * half_line(f) * abcd_series(z_dut(f)) * half_line(f) * pad(f)
    });

    let dut = SplitPi::new(&thru).unwrap().deembed(&raw).unwrap();
    assert_networks_close(&dut, &expected_dut(), 1e-9);
}

#[test]
fn test_split_tee() {
    let freq = lumped_grid();
    let line = |f: f64| abcd_series(c(R_LINE, omega(f) * 30e-12));
    let half_pad = |f: f64| abcd_shunt(c(0.0, omega(f) * C_PAD / 2.0));

    let thru = from_abcd(&freq, |f| line(f) * half_pad(f) * half_pad(f) * line(f));
    let raw = from_abcd(&freq, |f| {
        line(f) * half_pad(f) * abcd_series(z_dut(f)) * half_pad(f) * line(f)
    });

    let dut = SplitTee::new(&thru).unwrap().deembed(&raw).unwrap();
    assert_networks_close(&dut, &expected_dut(), 1e-9);
}

#[test]
fn test_admittance_cancel() {
    let freq = lumped_grid();
    let pad = |f: f64| abcd_shunt(c(1e-5, omega(f) * C_PAD));

    let thru = from_abcd(&freq, |f| pad(f) * pad(f));
    let raw = from_abcd(&freq, |f| pad(f) * abcd_series(z_dut(f)) * pad(f));

    let dut = AdmittanceCancel::new(&thru).unwrap().deembed(&raw).unwrap();
    assert_networks_close(&dut, &expected_dut(), 1e-9);
}

#[test]
fn test_impedance_cancel() {
    let freq = lumped_grid();
    let line = |f: f64| abcd_series(c(R_LINE, omega(f) * 50e-12));
    let dut_shunt = |f: f64| abcd_shunt(c(0.0, omega(f) * 100e-15));

    let thru = from_abcd(&freq, |f| line(f) * line(f));
    let raw = from_abcd(&freq, |f| line(f) * dut_shunt(f) * line(f));

    let dut = ImpedanceCancel::new(&thru).unwrap().deembed(&raw).unwrap();
    assert_networks_close(&dut, &from_abcd(&freq, dut_shunt), 1e-9);
}

#[test]
fn test_frequency_mismatch() {
    let (open, short, raw) = open_short_set();
    let other = skrf_deembed::frequency::Frequency::new(
        1.0,
        10.0,
        19,
        skrf_deembed::frequency::FrequencyUnit::GHz,
        skrf_deembed::frequency::SweepType::Linear,
    );
    let short_elsewhere = from_y(&other, y_pads);

    assert!(matches!(
        OpenShort::new(&open, &short_elsewhere),
        Err(DeembedError::FrequencyMismatch { .. })
    ));

    let dm = OpenShort::new(&open, &short).unwrap();
    assert!(matches!(
        dm.deembed(&short_elsewhere),
        Err(DeembedError::FrequencyMismatch { .. })
    ));
    assert!(dm.deembed(&raw).is_ok());
}

#[test]
fn test_algorithms_as_trait_objects() {
    let (open, short, raw) = open_short_set();
    let algorithms: Vec<Box<dyn Deembedding>> = vec![
        Box::new(Open::new(&open).unwrap()),
        Box::new(OpenShort::new(&open, &short).unwrap()),
        Box::new(ShortOpen::new(&short, &open).unwrap()),
    ];

    for dm in &algorithms {
        assert_eq!(dm.frequency().npoints(), raw.nfreq());
        assert_eq!(dm.deembed(&raw).unwrap().nfreq(), raw.nfreq());
    }
}

#[test]
fn test_deembed_from_several_threads() {
    let (open, short, raw) = open_short_set();
    let dm = OpenShort::new(&open, &short).unwrap();
    let expected = dm.deembed(&raw).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| dm.deembed(&raw).unwrap())).collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}
