//! Static reference tables used by the resolver and the scoring engine.
//!
//! Everything here is read-only policy data. The analyzer takes a `Catalog`
//! by value (it only holds `'static` slices) and lends it to each stage, so
//! tests can inject reduced tables without touching global state.

use crate::analysis::geo::{GeoPoint, Landmark};
use crate::error::AnalysisError;
use crate::ingestion::types::LawdCode;

/// Keywords that award a fixed score on a substring match
#[derive(Debug, Clone, Copy)]
pub struct KeywordTier {
    pub score: i32,
    pub keywords: &'static [&'static str],
}

impl KeywordTier {
    pub fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k))
    }
}

/// First tier (in order) with a keyword contained in `text`
pub fn first_tier_score(tiers: &[KeywordTier], text: &str) -> Option<i32> {
    tiers.iter().find(|t| t.matches(text)).map(|t| t.score)
}

#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    /// Employment hubs with importance weights
    pub business_districts: &'static [Landmark],
    /// Approximate centres of known dongs
    pub dong_coordinates: &'static [(&'static str, GeoPoint)],
    /// Major subway stations used for transit distance
    pub stations: &'static [Landmark],
    pub brand_tiers: &'static [KeywordTier],
    pub brand_default: i32,
    pub education_tiers: &'static [KeywordTier],
    pub education_default: i32,
    /// Dong keyword heuristic used when a dong has no coordinate
    pub location_fallback: &'static [KeywordTier],
    pub location_fallback_default: i32,
    /// Dong keywords that imply a nearby station
    pub transit_keywords: &'static [&'static str],
    pub workplace_regions: &'static [(&'static str, &'static [&'static str])],
    /// Unordered workplace pairs and the regions between them
    pub midpoint_regions: &'static [(&'static str, &'static str, &'static [&'static str])],
    pub region_codes: &'static [(&'static str, &'static str)],
    /// Lawd-code prefix to the province name used by the statistics tables
    pub provinces: &'static [(&'static str, &'static str)],
    pub default_province: &'static str,
}

impl Catalog {
    /// Seoul capital-area tables
    pub fn standard() -> Self {
        STANDARD
    }

    /// Administrative code for a region name
    pub fn region_code(&self, region: &str) -> Result<LawdCode, AnalysisError> {
        let region = region.trim();
        self.region_codes
            .iter()
            .find(|(name, _)| *name == region)
            .ok_or_else(|| AnalysisError::RegionNotFound(region.to_string()))
            .and_then(|(_, code)| LawdCode::parse(code))
    }

    /// Province name for a region code; unknown prefixes fall back to Seoul
    pub fn province_for(&self, code: &str) -> &'static str {
        self.provinces
            .iter()
            .find(|(prefix, _)| code.starts_with(prefix))
            .map(|(_, name)| *name)
            .unwrap_or(self.default_province)
    }
}

const STANDARD: Catalog = Catalog {
    business_districts: BUSINESS_DISTRICTS,
    dong_coordinates: DONG_COORDINATES,
    stations: STATIONS,
    brand_tiers: BRAND_TIERS,
    brand_default: 65,
    education_tiers: EDUCATION_TIERS,
    education_default: 65,
    location_fallback: LOCATION_FALLBACK,
    location_fallback_default: 15,
    transit_keywords: TRANSIT_KEYWORDS,
    workplace_regions: WORKPLACE_REGIONS,
    midpoint_regions: MIDPOINT_REGIONS,
    region_codes: REGION_CODES,
    provinces: PROVINCES,
    default_province: "서울",
};

const BUSINESS_DISTRICTS: &[Landmark] = &[
    // Gangnam
    Landmark::new("강남역", 37.4979, 127.0276, 100.0),
    Landmark::new("삼성역", 37.5087, 127.0633, 95.0),
    Landmark::new("역삼역", 37.5003, 127.0364, 90.0),
    Landmark::new("선릉역", 37.5045, 127.0493, 90.0),
    // Seocho
    Landmark::new("서초역", 37.4837, 127.0059, 85.0),
    Landmark::new("교대역", 37.4934, 127.0143, 85.0),
    Landmark::new("양재역", 37.4844, 127.0344, 80.0),
    // Pangyo
    Landmark::new("판교역", 37.3949, 127.1111, 90.0),
    Landmark::new("판교테크노밸리", 37.4020, 127.1070, 90.0),
    // Dongtan
    Landmark::new("동탄역", 37.2015, 127.0700, 70.0),
    // Yeouido
    Landmark::new("여의도역", 37.5214, 126.9245, 90.0),
    Landmark::new("여의도공원", 37.5282, 126.9248, 85.0),
    // Magok
    Landmark::new("마곡나루역", 37.5615, 126.8245, 85.0),
    Landmark::new("LG사이언스파크", 37.5650, 126.8130, 85.0),
    // Songpa / Jamsil
    Landmark::new("잠실역", 37.5133, 127.1000, 85.0),
    Landmark::new("석촌역", 37.5059, 127.1058, 80.0),
    // CBD
    Landmark::new("광화문", 37.5720, 126.9769, 75.0),
    Landmark::new("시청역", 37.5653, 126.9770, 75.0),
];

const DONG_COORDINATES: &[(&str, GeoPoint)] = &[
    // Gangnam-gu
    ("대치동", GeoPoint::new(37.4947, 127.0626)),
    ("개포동", GeoPoint::new(37.4787, 127.0466)),
    ("도곡동", GeoPoint::new(37.4893, 127.0512)),
    ("역삼동", GeoPoint::new(37.5004, 127.0364)),
    ("삼성동", GeoPoint::new(37.5087, 127.0633)),
    ("논현동", GeoPoint::new(37.5107, 127.0275)),
    ("압구정동", GeoPoint::new(37.5265, 127.0280)),
    ("청담동", GeoPoint::new(37.5225, 127.0483)),
    // Seocho-gu
    ("서초동", GeoPoint::new(37.4838, 127.0165)),
    ("반포동", GeoPoint::new(37.5053, 127.0040)),
    ("잠원동", GeoPoint::new(37.5144, 127.0120)),
    ("방배동", GeoPoint::new(37.4790, 126.9937)),
    // Songpa-gu
    ("잠실동", GeoPoint::new(37.5133, 127.1000)),
    ("문정동", GeoPoint::new(37.4857, 127.1217)),
    ("가락동", GeoPoint::new(37.4959, 127.1182)),
    // Gangdong-gu
    ("천호동", GeoPoint::new(37.5387, 127.1238)),
    ("둔촌동", GeoPoint::new(37.5270, 127.1357)),
    // Bundang
    ("분당동", GeoPoint::new(37.3777, 127.1178)),
    ("정자동", GeoPoint::new(37.3603, 127.1083)),
    ("서현동", GeoPoint::new(37.3841, 127.1214)),
    ("이매동", GeoPoint::new(37.3905, 127.1261)),
    ("야탑동", GeoPoint::new(37.4112, 127.1280)),
    ("수내동", GeoPoint::new(37.3835, 127.0964)),
    // Pangyo
    ("판교동", GeoPoint::new(37.3949, 127.1111)),
    ("삼평동", GeoPoint::new(37.4020, 127.1070)),
    ("백현동", GeoPoint::new(37.3932, 127.1023)),
    // Yongin
    ("수지구", GeoPoint::new(37.3236, 127.0896)),
    ("기흥구", GeoPoint::new(37.2760, 127.1158)),
    ("구미동", GeoPoint::new(37.2971, 127.0846)),
    ("운중동", GeoPoint::new(37.3126, 127.0958)),
    // Hwaseong / Suwon
    ("화성시", GeoPoint::new(37.1996, 126.8312)),
    ("수원시", GeoPoint::new(37.2636, 127.0286)),
    // Gwacheon
    ("과천시", GeoPoint::new(37.4292, 126.9873)),
    ("중앙동", GeoPoint::new(37.4331, 126.9885)),
    ("별양동", GeoPoint::new(37.4280, 126.9790)),
    ("부림동", GeoPoint::new(37.4370, 126.9930)),
    // Anyang
    ("안양시", GeoPoint::new(37.3943, 126.9568)),
    ("평촌동", GeoPoint::new(37.3895, 126.9513)),
    ("범계동", GeoPoint::new(37.3895, 126.9490)),
    // Yeongdeungpo / Mapo
    ("영등포구", GeoPoint::new(37.5264, 126.8962)),
    ("여의도동", GeoPoint::new(37.5214, 126.9245)),
    ("마포구", GeoPoint::new(37.5663, 126.9015)),
    // Gangseo
    ("강서구", GeoPoint::new(37.5509, 126.8495)),
    ("마곡동", GeoPoint::new(37.5650, 126.8130)),
    // Dongtan
    ("반송동", GeoPoint::new(37.1970, 127.0755)),
    ("청계동", GeoPoint::new(37.2015, 127.0700)),
    ("오산동", GeoPoint::new(37.2070, 127.0850)),
    ("목동", GeoPoint::new(37.1920, 127.0630)),
    ("산척동", GeoPoint::new(37.1880, 127.0520)),
    ("능동", GeoPoint::new(37.1850, 127.0720)),
    ("장지동", GeoPoint::new(37.1770, 127.0580)),
    ("영천동", GeoPoint::new(37.2100, 127.0780)),
    ("기산동", GeoPoint::new(37.1820, 127.0680)),
];

const STATIONS: &[Landmark] = &[
    Landmark::new("강남역", 37.4979, 127.0276, 0.0),
    Landmark::new("역삼역", 37.5003, 127.0364, 0.0),
    Landmark::new("선릉역", 37.5045, 127.0493, 0.0),
    Landmark::new("삼성역", 37.5087, 127.0633, 0.0),
    Landmark::new("교대역", 37.4934, 127.0143, 0.0),
    Landmark::new("서초역", 37.4837, 127.0059, 0.0),
    Landmark::new("판교역", 37.3949, 127.1111, 0.0),
    Landmark::new("양재역", 37.4844, 127.0344, 0.0),
    Landmark::new("잠실역", 37.5133, 127.1000, 0.0),
    Landmark::new("종로3가역", 37.5712, 126.9912, 0.0),
];

const BRAND_TIERS: &[KeywordTier] = &[
    KeywordTier {
        score: 95,
        keywords: &["래미안", "자이", "힐스테이트", "더샵"],
    },
    KeywordTier {
        score: 90,
        keywords: &["아이파크", "e편한세상", "푸르지오", "롯데캐슬", "캐슬"],
    },
    KeywordTier {
        score: 85,
        keywords: &["두산위브", "위브", "디에이치", "SK"],
    },
    KeywordTier {
        score: 80,
        keywords: &["호반", "포레나", "포스코", "한화", "대림", "금강", "반도", "유보라"],
    },
    KeywordTier {
        score: 75,
        keywords: &[
            "경남", "신동아", "삼성", "벽산", "쌍용", "진흥", "동원", "동남", "우미린", "코오롱",
        ],
    },
];

const EDUCATION_TIERS: &[KeywordTier] = &[
    KeywordTier {
        score: 95,
        keywords: &["대치동", "개포동", "도곡동", "수서동", "압구정동", "청담동"],
    },
    KeywordTier {
        score: 85,
        keywords: &[
            "서초동", "반포동", "잠원동", "목동", "중계동", "노원구", "정자동", "서현동", "분당동",
            "수내동", "판교동", "삼평동", "이매동", "야탑동", "송파", "잠실", "문정동",
        ],
    },
    KeywordTier {
        score: 75,
        keywords: &[
            "구미동", "운중동", "백현동", "대장동", "마곡", "목동", "상암동", "가락동", "방이동",
        ],
    },
];

const LOCATION_FALLBACK: &[KeywordTier] = &[
    KeywordTier {
        score: 30,
        keywords: &["대치동", "압구정동", "청담동"],
    },
    KeywordTier {
        score: 28,
        keywords: &["삼성동", "역삼동", "논현동"],
    },
    KeywordTier {
        score: 27,
        keywords: &["개포동", "도곡동", "세곡동"],
    },
    KeywordTier {
        score: 26,
        keywords: &["서초동", "반포동", "잠원동"],
    },
    KeywordTier {
        score: 25,
        keywords: &["판교", "삼평동", "백현동"],
    },
    KeywordTier {
        score: 24,
        keywords: &["정자동", "서현동", "분당동"],
    },
    KeywordTier {
        score: 23,
        keywords: &["이매동", "야탑동", "수내동"],
    },
    KeywordTier {
        score: 24,
        keywords: &["마곡", "발산동", "여의도"],
    },
    KeywordTier {
        score: 22,
        keywords: &["구미동", "운중동", "금곡동"],
    },
    KeywordTier {
        score: 21,
        keywords: &["잠실", "송파", "문정동"],
    },
];

const TRANSIT_KEYWORDS: &[&str] = &[
    "역삼", "강남", "삼성", "판교", "정자", "야탑", "서현", "수내", "잠실",
];

const WORKPLACE_REGIONS: &[(&str, &[&str])] = &[
    // Gangnam belt
    ("강남", &["강남구", "서초구", "송파구", "강동구", "분당구", "수지구"]),
    ("강남구", &["강남구", "서초구", "송파구", "강동구", "분당구"]),
    ("서초", &["서초구", "강남구", "송파구", "관악구", "동작구", "과천시"]),
    ("서초구", &["서초구", "강남구", "송파구", "관악구", "과천시"]),
    ("송파", &["송파구", "강남구", "강동구", "하남시", "분당구"]),
    ("송파구", &["송파구", "강남구", "강동구", "하남시"]),
    // Pangyo / Bundang
    ("판교", &["분당구", "수지구", "기흥구", "용인시", "성남시"]),
    ("분당", &["분당구", "수지구", "용인시", "성남시"]),
    ("분당구", &["분당구", "수지구", "용인시", "성남시"]),
    ("성남", &["성남시", "분당구", "수지구", "하남시"]),
    // Yeouido / Yeongdeungpo
    ("여의도", &["영등포구", "마포구", "양천구", "강서구", "광명시"]),
    ("영등포", &["영등포구", "마포구", "양천구", "광명시"]),
    // Gangseo / Magok
    ("마곡", &["강서구", "양천구", "김포시", "부천시"]),
    ("강서", &["강서구", "양천구", "김포시", "부천시"]),
    // Suwon / Hwaseong / Dongtan
    ("수원", &["수원시", "용인시", "화성시", "오산시"]),
    ("화성", &["화성시", "수원시", "용인시", "오산시", "평택시"]),
    ("동탄", &["화성시", "수원시", "용인시", "오산시"]),
    ("평택", &["평택시", "화성시", "오산시"]),
    // Gwacheon / Anyang
    ("과천", &["과천시", "안양시", "군포시", "의왕시", "서초구"]),
    ("안양", &["안양시", "과천시", "군포시", "의왕시"]),
    // Yongin
    ("용인", &["용인시", "수지구", "기흥구", "성남시", "화성시"]),
    ("수지", &["수지구", "용인시", "분당구"]),
    ("기흥", &["기흥구", "용인시", "수원시"]),
];

const MIDPOINT_REGIONS: &[(&str, &str, &[&str])] = &[
    ("화성", "과천", &["의왕시", "수원시", "군포시", "안양시"]),
    ("화성", "강남", &["수원시", "용인시", "성남시", "분당구"]),
    ("화성", "서초", &["수원시", "용인시", "성남시", "과천시"]),
    ("과천", "강남", &["서초구", "강남구", "관악구"]),
    ("과천", "서초", &["서초구", "강남구", "관악구"]),
    ("판교", "강남", &["분당구", "성남시", "서초구"]),
    ("판교", "서초", &["분당구", "성남시", "서초구"]),
    ("여의도", "강남", &["영등포구", "동작구", "서초구"]),
    ("여의도", "서초", &["영등포구", "동작구", "서초구"]),
    ("마곡", "강남", &["영등포구", "양천구", "강서구"]),
    ("수원", "강남", &["용인시", "성남시", "분당구"]),
    ("수원", "서초", &["용인시", "성남시", "과천시"]),
    ("용인", "강남", &["성남시", "분당구"]),
    ("용인", "서초", &["성남시", "분당구", "과천시"]),
    ("평택", "과천", &["화성시", "수원시", "의왕시"]),
    ("평택", "강남", &["화성시", "수원시", "용인시"]),
];

const REGION_CODES: &[(&str, &str)] = &[
    // Seoul, all 25 districts
    ("강남구", "11680"),
    ("강동구", "11740"),
    ("강북구", "11305"),
    ("강서구", "11500"),
    ("관악구", "11620"),
    ("광진구", "11215"),
    ("구로구", "11530"),
    ("금천구", "11545"),
    ("노원구", "11350"),
    ("도봉구", "11320"),
    ("동대문구", "11230"),
    ("동작구", "11590"),
    ("마포구", "11440"),
    ("서대문구", "11410"),
    ("서초구", "11650"),
    ("성동구", "11200"),
    ("성북구", "11290"),
    ("송파구", "11710"),
    ("양천구", "11470"),
    ("영등포구", "11560"),
    ("용산구", "11170"),
    ("은평구", "11380"),
    ("종로구", "11110"),
    ("중구", "11140"),
    ("중랑구", "11260"),
    // Gyeonggi cities and districts
    ("수원시", "41110"),
    ("성남시", "41130"),
    ("분당구", "41135"),
    ("수정구", "41131"),
    ("중원구", "41133"),
    ("고양시", "41280"),
    ("용인시", "41460"),
    ("수지구", "41465"),
    ("기흥구", "41463"),
    ("처인구", "41461"),
    ("부천시", "41190"),
    ("안산시", "41270"),
    ("안양시", "41170"),
    ("만안구", "41171"),
    ("동안구", "41173"),
    ("남양주시", "41360"),
    ("화성시", "41590"),
    ("평택시", "41220"),
    ("의정부시", "41150"),
    ("시흥시", "41390"),
    ("파주시", "41480"),
    ("김포시", "41570"),
    ("광명시", "41210"),
    ("광주시", "41610"),
    ("군포시", "41410"),
    ("오산시", "41370"),
    ("이천시", "41500"),
    ("양주시", "41630"),
    ("안성시", "41550"),
    ("구리시", "41310"),
    ("포천시", "41650"),
    ("의왕시", "41430"),
    ("하남시", "41450"),
    ("여주시", "41670"),
    ("과천시", "41290"),
    // Common aliases
    ("판교", "41135"),
    ("판교동", "41135"),
    ("삼평동", "41135"),
    ("백현동", "41135"),
    ("마곡", "11500"),
    ("마곡동", "11500"),
    ("여의도", "11560"),
    ("목동", "11470"),
    ("잠실", "11710"),
    ("강남", "11680"),
    ("서초", "11650"),
    ("송파", "11710"),
    ("화성", "41590"),
    ("수원", "41110"),
    ("용인", "41460"),
    ("과천", "41290"),
    ("안양", "41170"),
    ("평택", "41220"),
    ("군포", "41410"),
    ("의왕", "41430"),
    ("하남", "41450"),
    ("광주", "41610"),
];

const PROVINCES: &[(&str, &str)] = &[("11", "서울"), ("41", "경기"), ("28", "인천")];
