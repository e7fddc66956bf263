use std::collections::HashSet;
use std::sync::LazyLock;

/// Event codes the upstream profile allows on disaster notifications.
/// Alerts carrying any other code are nacked as profile violations.
///
/// Weather families carry advisory (`*A`), warning (`*W`) and emergency
/// (`*E`) grades.
pub static VALID_EVENT_CODES: &[&str] = &[
    // Heat, cold, rain, snow, wind, waves, typhoon, yellow dust
    "HTA", "HTW", "HTE", "CDA", "CDW", "CDE", "HRA", "HRW", "HRE", "SNA", "SNW", "SNE",
    "WNA", "WNW", "WNE", "WVA", "WVW", "WVE", "TYA", "TYW", "TYE", "YSA", "YSW", "YSE",
    // Drought, fog, tidal, dryness, freeze, hail, lightning, rapid thaw
    "DRA", "DRW", "DRE", "FGA", "FGW", "FGE", "TRA", "TRW", "TRE", "DWA", "DWW", "DWE",
    "FZA", "FZW", "FZE", "HLA", "HLW", "HLE", "LTA", "LTW", "LTE", "RSA", "RSW", "RSE",
    // Marine weather
    "MSA", "MSW", "MSE", "MFA", "MFW", "MFE", "MWA", "MWW", "MWE", "SSA", "SSW", "SSE",
    // Severe convection and winter extremes
    "TOR", "WSP", "DST", "SLT", "BLZ", "ICS", "FRS", "UVH",
    // Geological
    "EQK", "EQL", "EQO", "TSU", "TSW", "VOE", "VOA", "LSL", "GSS", "AVL",
    // Flood and dam
    "FLD", "FFL", "RIF", "UIF", "DMB", "DMD", "RSF", "LVB", "CSF",
    // Fire
    "FRE", "FRB", "FRM", "FRF", "WFR", "FFR", "TFR", "SFR", "HFR",
    // Hazardous materials and industry
    "CHS", "CHL", "GSL", "GSE", "OSP", "RAD", "RDL", "NUC", "NPP", "BIO", "TOX", "EXP",
    "MNA", "IDA", "LPG", "CMX", "PIP",
    // Infrastructure and lifelines
    "PWO", "PWS", "ELG", "WSO", "WSC", "SWG", "CMO", "BRC", "BDC", "RDC", "TNC", "RWA",
    "SBA", "APA", "SHA", "FRY", "HBR", "TRC", "GAS", "OIL", "FOD", "MED", "HSP", "BLD",
    // Roads and transport
    "HWY", "ICE", "SNR", "TRJ", "ACC", "BUS", "TRD", "TRF", "AIC", "AIH", "AIE",
    // Maritime distress
    "SOS", "DRT",
    // Nuclear fuel cycle
    "NPE", "RWS", "SPF",
    // Public health
    "EPD", "PAN", "FLU", "MRS", "COV", "FBP", "LPS", "AIV", "FMD", "ASF", "PST", "MDS",
    "WNV", "DGF", "MPX",
    // Civil defense and security
    "CVD", "ARD", "ARW", "MSL", "ATK", "TRR", "BMB", "CBR", "EMG", "EVC", "EVL", "SHL",
    "CWW", "MIA",
    // Social and crowd
    "MPA", "CRA", "STM", "FST", "SPE", "PRT", "BLK", "CYB", "FIN", "BRD",
    // Environment
    "APO", "FDA", "FDW", "FDE", "OZA", "OZW", "OZE", "WPO", "MPO", "RTD", "GTD", "JYF",
    "DRK", "HAB",
    // Space weather
    "SOF", "GMS", "STD",
];

static CODE_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| VALID_EVENT_CODES.iter().copied().collect());

pub fn is_valid_event_code(code: &str) -> bool {
    CODE_SET.contains(code)
}
