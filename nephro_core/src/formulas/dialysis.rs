//! # Dialysis Adequacy
//!
//! Hemodialysis dose (single-pool, equilibrated and standard Kt/V, URR),
//! peritoneal dialysis weekly Kt/V, the Watson total body water estimate,
//! normalized protein catabolic rate and ultrafiltration rate.
//!
//! ## Notation
//!
//! - `R` = post-dialysis BUN / pre-dialysis BUN
//! - `t` = session length (hours unless the argument says minutes)
//! - `UF` = ultrafiltration volume (L)
//! - `W` = post-dialysis weight (kg)
//!
//! ## References
//!
//! - Daugirdas JT. J Am Soc Nephrol 1993;4:1205-13 (second-generation spKt/V)
//! - Daugirdas JT, Schneditz D. ASAIO J 1995;41:M719-24 (rate equation, eKt/V)
//! - Leypoldt JK et al. Kidney Int 2004;66:1669-74 (FHN standard Kt/V)
//! - Watson PE et al. Am J Clin Nutr 1980;33:27-39
//! - Depner TA, Daugirdas JT. J Am Soc Nephrol 1996;7:780-5 (nPCR)

use super::{ratio, Sex};

/// Minutes in a week, used by standard Kt/V
const MINUTES_PER_WEEK: f64 = 10080.0;

/// Single-pool Kt/V, Daugirdas second generation.
///
/// ```text
/// Kt/V = -ln(R - 0.008 × t) + (4 - 3.5 × R) × UF / W
/// ```
///
/// Returns `None` when `R - 0.008 × t ≤ 0` (the logarithm is undefined),
/// or when pre-BUN or weight is not positive.
pub fn ktv_daugirdas(pre_bun: f64, post_bun: f64, session_minutes: f64, uf_liters: f64, post_weight_kg: f64) -> Option<f64> {
    if pre_bun <= 0.0 || post_weight_kg <= 0.0 {
        return None;
    }
    let r = post_bun / pre_bun;
    let t = session_minutes / 60.0;
    let arg = r - 0.008 * t;
    if arg <= 0.0 {
        return None;
    }
    Some(-arg.ln() + (4.0 - 3.5 * r) * uf_liters / post_weight_kg)
}

/// Urea reduction ratio (%): `(pre - post) / pre × 100`
pub fn urr(pre_bun: f64, post_bun: f64) -> Option<f64> {
    ratio(pre_bun - post_bun, pre_bun).map(|r| r * 100.0)
}

/// Equilibrated Kt/V from single-pool Kt/V (arterial access).
///
/// ```text
/// eKt/V = spKt/V - 0.6 × spKt/V / t + 0.03
/// ```
pub fn ektv(sp_ktv: f64, session_minutes: f64) -> Option<f64> {
    let t = session_minutes / 60.0;
    if t <= 0.0 {
        return None;
    }
    Some(sp_ktv - 0.6 * sp_ktv / t + 0.03)
}

/// Weekly standard Kt/V (FHN / Leypoldt), from eKt/V.
///
/// ```text
///            10080 × (1 - e^-eKt/V) / t
/// stdKt/V = ─────────────────────────────────────────
///           (1 - e^-eKt/V) / eKt/V + 10080 / (N × t) - 1
/// ```
///
/// `t` in minutes, `N` sessions per week.
pub fn std_ktv(ektv: f64, session_minutes: f64, sessions_per_week: f64) -> Option<f64> {
    if ektv <= 0.0 || session_minutes <= 0.0 || sessions_per_week <= 0.0 {
        return None;
    }
    let removed = 1.0 - (-ektv).exp();
    let numerator = MINUTES_PER_WEEK * removed / session_minutes;
    let denominator = removed / ektv + MINUTES_PER_WEEK / (sessions_per_week * session_minutes) - 1.0;
    ratio(numerator, denominator)
}

/// Watson total body water (L).
///
/// ```text
/// Male:   2.447 - 0.09516 × age + 0.1074 × height + 0.3362 × weight
/// Female: -2.097 + 0.1069 × height + 0.2466 × weight
/// ```
pub fn watson_tbw(age: f64, height_cm: f64, weight_kg: f64, sex: Sex) -> f64 {
    match sex {
        Sex::Male => 2.447 - 0.09516 * age + 0.1074 * height_cm + 0.3362 * weight_kg,
        Sex::Female => -2.097 + 0.1069 * height_cm + 0.2466 * weight_kg,
    }
}

/// Residual kidney function contribution to PD clearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualUrine {
    /// Urine urea nitrogen (mg/dL)
    pub urea: f64,
    /// Daily urine volume (L)
    pub volume_l: f64,
}

/// Weekly Kt/V for peritoneal dialysis.
///
/// ```text
/// peritoneal = D/P urea × drained volume (L/day)
/// renal      = U/P urea × urine volume (L/day)
/// weekly Kt/V = 7 × (peritoneal + renal) / V
/// ```
pub fn pd_weekly_ktv(
    dialysate_urea: f64,
    plasma_urea: f64,
    drain_volume_l: f64,
    residual: Option<ResidualUrine>,
    tbw_l: f64,
) -> Option<f64> {
    if tbw_l <= 0.0 {
        return None;
    }
    let peritoneal = ratio(dialysate_urea, plasma_urea)? * drain_volume_l;
    let renal = match residual {
        Some(urine) => ratio(urine.urea, plasma_urea)? * urine.volume_l,
        None => 0.0,
    };
    Some(7.0 * (peritoneal + renal) / tbw_l)
}

/// Normalized protein catabolic rate (g/kg/day), midweek session.
///
/// ```text
/// nPCR = C0 / (36.3 + 5.48 × Kt/V + 53.5 / Kt/V) + 0.168
/// ```
pub fn npcr(pre_bun: f64, sp_ktv: f64) -> Option<f64> {
    if sp_ktv <= 0.0 {
        return None;
    }
    ratio(pre_bun, 36.3 + 5.48 * sp_ktv + 53.5 / sp_ktv).map(|v| v + 0.168)
}

/// Ultrafiltration rate (mL/kg/h)
pub fn ultrafiltration_rate(uf_ml: f64, weight_kg: f64, session_minutes: f64) -> Option<f64> {
    ratio(uf_ml, weight_kg * session_minutes / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_ktv_reference() {
        // pre 80, post 25, 240 min, UF 3 L, 70 kg -> ~1.35 (±0.15)
        let ktv = ktv_daugirdas(80.0, 25.0, 240.0, 3.0, 70.0).unwrap();
        assert!(close(ktv, 1.35, 0.15), "got {}", ktv);
        assert!(close(ktv, 1.3957, 0.001));
    }

    #[test]
    fn test_ktv_domain_guard() {
        // R = 0.8, t = 110 h -> R - 0.008t = -0.08
        assert_eq!(ktv_daugirdas(50.0, 40.0, 6600.0, 2.0, 70.0), None);
        // Long session with R close to 1
        assert_eq!(ktv_daugirdas(100.0, 99.0, 7500.0, 0.0, 70.0), None);
        assert_eq!(ktv_daugirdas(0.0, 25.0, 240.0, 3.0, 70.0), None);
        assert_eq!(ktv_daugirdas(80.0, 25.0, 240.0, 3.0, 0.0), None);
    }

    #[test]
    fn test_ktv_no_guard_for_valid_long_session() {
        // pre 10, post 9, 600 min: R - 0.08 = 0.82 > 0
        assert!(ktv_daugirdas(10.0, 9.0, 600.0, 0.0, 70.0).is_some());
    }

    #[test]
    fn test_urr() {
        assert!(close(urr(80.0, 25.0).unwrap(), 68.75, 1e-9));
        assert_eq!(urr(0.0, 25.0), None);
    }

    #[test]
    fn test_ektv() {
        let e = ektv(1.4, 240.0).unwrap();
        assert!(close(e, 1.22, 1e-9));
        assert_eq!(ektv(1.4, 0.0), None);
    }

    #[test]
    fn test_std_ktv() {
        let std = std_ktv(1.2, 240.0, 3.0).unwrap();
        assert!(close(std, 2.161, 0.005), "got {}", std);
        assert_eq!(std_ktv(0.0, 240.0, 3.0), None);
    }

    #[test]
    fn test_watson() {
        assert!(close(watson_tbw(50.0, 175.0, 70.0, Sex::Male), 40.018, 0.001));
        assert!(close(watson_tbw(50.0, 165.0, 60.0, Sex::Female), 30.32, 0.01));
    }

    #[test]
    fn test_pd_weekly_ktv() {
        let residual = ResidualUrine { urea: 300.0, volume_l: 0.5 };
        let ktv = pd_weekly_ktv(42.0, 60.0, 10.0, Some(residual), 35.0).unwrap();
        assert!(close(ktv, 1.9, 1e-9));
        let anuric = pd_weekly_ktv(42.0, 60.0, 10.0, None, 35.0).unwrap();
        assert!(close(anuric, 1.4, 1e-9));
        assert_eq!(pd_weekly_ktv(42.0, 0.0, 10.0, None, 35.0), None);
    }

    #[test]
    fn test_npcr() {
        assert!(close(npcr(60.0, 1.4).unwrap(), 0.898, 0.001));
        assert_eq!(npcr(60.0, 0.0), None);
    }

    #[test]
    fn test_uf_rate() {
        assert!(close(ultrafiltration_rate(3000.0, 70.0, 240.0).unwrap(), 10.714, 0.001));
    }
}
