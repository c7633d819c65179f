//! PHI type enumeration

use crate::domain::DeidError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PHI type covering the HIPAA Safe Harbor identifiers plus Mexican
/// jurisdiction-specific identifiers
///
/// The set is closed: a new type requires a new variant, never an ad hoc string.
/// Serialized form and placeholder label are the same uppercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhiType {
    // HIPAA Safe Harbor
    /// Names (patients, physicians, relatives)
    Name,
    /// All date elements except year
    Date,
    /// Telephone numbers
    Phone,
    /// Fax numbers
    Fax,
    /// Email addresses
    Email,
    /// Social Security Numbers
    Ssn,
    /// Medical record numbers (NHC, expediente, folio)
    Mrn,
    /// Health plan beneficiary numbers (póliza, afiliación)
    HealthPlan,
    /// Account numbers
    Account,
    /// Certificate/license numbers (cédula profesional)
    License,
    /// Vehicle identifiers (plates, VIN)
    Vehicle,
    /// Device identifiers and serial numbers
    Device,
    /// Web URLs
    Url,
    /// IP addresses
    IpAddress,
    /// Biometric identifiers
    Biometric,
    /// Photograph references
    Photo,
    /// Geographic subdivisions smaller than a state (street, ZIP)
    Location,
    /// Ages over 89
    #[serde(rename = "AGE_OVER_89")]
    AgeOver89,

    // Mexican identifiers
    /// Clave Única de Registro de Población
    Curp,
    /// Registro Federal de Contribuyentes (tax ID)
    Rfc,
    /// Número de Seguridad Social (IMSS)
    Nss,
    /// INE/IFE voter credential
    Ine,
}

impl PhiType {
    /// Every variant in declaration order
    pub const ALL: [PhiType; 22] = [
        Self::Name,
        Self::Date,
        Self::Phone,
        Self::Fax,
        Self::Email,
        Self::Ssn,
        Self::Mrn,
        Self::HealthPlan,
        Self::Account,
        Self::License,
        Self::Vehicle,
        Self::Device,
        Self::Url,
        Self::IpAddress,
        Self::Biometric,
        Self::Photo,
        Self::Location,
        Self::AgeOver89,
        Self::Curp,
        Self::Rfc,
        Self::Nss,
        Self::Ine,
    ];

    /// Uppercase label used in placeholders and pattern libraries
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "NAME",
            Self::Date => "DATE",
            Self::Phone => "PHONE",
            Self::Fax => "FAX",
            Self::Email => "EMAIL",
            Self::Ssn => "SSN",
            Self::Mrn => "MRN",
            Self::HealthPlan => "HEALTH_PLAN",
            Self::Account => "ACCOUNT",
            Self::License => "LICENSE",
            Self::Vehicle => "VEHICLE",
            Self::Device => "DEVICE",
            Self::Url => "URL",
            Self::IpAddress => "IP_ADDRESS",
            Self::Biometric => "BIOMETRIC",
            Self::Photo => "PHOTO",
            Self::Location => "LOCATION",
            Self::AgeOver89 => "AGE_OVER_89",
            Self::Curp => "CURP",
            Self::Rfc => "RFC",
            Self::Nss => "NSS",
            Self::Ine => "INE",
        }
    }

    /// Check if this type is one of the HIPAA Safe Harbor identifiers
    pub fn is_hipaa_identifier(&self) -> bool {
        !self.is_jurisdictional()
    }

    /// Check if this type is a Mexican jurisdiction-specific identifier
    pub fn is_jurisdictional(&self) -> bool {
        matches!(self, Self::Curp | Self::Rfc | Self::Nss | Self::Ine)
    }
}

impl fmt::Display for PhiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PhiType {
    type Err = DeidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        if let Some(found) = Self::ALL.iter().find(|t| t.label() == normalized) {
            return Ok(*found);
        }
        match normalized.as_str() {
            "PERSON" => Ok(Self::Name),
            "MEDICAL_RECORD_NUMBER" => Ok(Self::Mrn),
            "HEALTH_PLAN_NUMBER" => Ok(Self::HealthPlan),
            "ACCOUNT_NUMBER" => Ok(Self::Account),
            "LICENSE_NUMBER" | "CERTIFICATE_LICENSE_NUMBER" => Ok(Self::License),
            "VEHICLE_IDENTIFIER" => Ok(Self::Vehicle),
            "DEVICE_IDENTIFIER" => Ok(Self::Device),
            "WEB_URL" => Ok(Self::Url),
            "IP" => Ok(Self::IpAddress),
            "BIOMETRIC_IDENTIFIER" => Ok(Self::Biometric),
            "PHOTO_IMAGE" | "FACE_PHOTOGRAPH" => Ok(Self::Photo),
            "GEOGRAPHIC_LOCATION" | "GEOGRAPHIC" => Ok(Self::Location),
            "NSS_IMSS" => Ok(Self::Nss),
            "INE_IFE" => Ok(Self::Ine),
            _ => Err(DeidError::Configuration(format!("Unknown PHI type: {s}"))),
        }
    }
}
