/// Known upstream server regions
use crate::error::OctaviaError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Closed set of regions the upstream platform serves stages from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "cn_gf01")]
    CnGf01,
    #[serde(rename = "os_usa")]
    OsUsa,
    #[serde(rename = "os_euro")]
    OsEuro,
    #[serde(rename = "os_asia")]
    OsAsia,
    #[serde(rename = "os_cht")]
    OsCht,
}

/// Which upstream host family answers for a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionGroup {
    /// miyoushe.com
    Mainland,
    /// hoyolab.com
    Overseas,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::CnGf01,
        Region::OsUsa,
        Region::OsEuro,
        Region::OsAsia,
        Region::OsCht,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::CnGf01 => "cn_gf01",
            Region::OsUsa => "os_usa",
            Region::OsEuro => "os_euro",
            Region::OsAsia => "os_asia",
            Region::OsCht => "os_cht",
        }
    }

    pub fn group(&self) -> RegionGroup {
        match self {
            Region::CnGf01 => RegionGroup::Mainland,
            _ => RegionGroup::Overseas,
        }
    }

    /// Display name used by the front-end region picker
    pub fn display_name(&self) -> &'static str {
        match self {
            Region::CnGf01 => "天空岛",
            Region::OsUsa => "America",
            Region::OsEuro => "Europe",
            Region::OsAsia => "Asia",
            Region::OsCht => "TW, HK, MO",
        }
    }

    /// Base URL of the platform's stage detail page
    pub fn stage_link_base(&self) -> &'static str {
        match self.group() {
            RegionGroup::Mainland => {
                "https://act.miyoushe.com/ys/ugc_community/mx/#/pages/level-detail/index"
            }
            RegionGroup::Overseas => {
                "https://act.hoyolab.com/ys/ugc_community/mx/#/pages/level-detail/index"
            }
        }
    }

    /// Base URL of the platform's account page
    pub fn author_link_base(&self) -> &'static str {
        match self.group() {
            RegionGroup::Mainland => "https://www.miyoushe.com/ys/accountCenter",
            RegionGroup::Overseas => "https://www.hoyolab.com/accountCenter",
        }
    }

    fn valid_list() -> String {
        Region::ALL
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = OctaviaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| OctaviaError::InvalidRegion {
                region: s.to_string(),
                valid: Region::valid_list(),
            })
    }
}
