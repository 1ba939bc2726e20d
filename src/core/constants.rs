// Constants shared by DMR codeplugs - tones, DCS codes, ID ranges
// CTCSS tones are kept in tenths of a hertz, matching their BCD storage

/// 50 standard CTCSS tones (tenths of Hz)
pub const CTCSS_TONES: [u16; 50] = [
    670, 693, 719, 744, 770, 797, 825, 854, 885, 915, 948, 974, 1000, 1035, 1072, 1109, 1148,
    1188, 1230, 1273, 1318, 1365, 1413, 1462, 1514, 1567, 1598, 1622, 1655, 1679, 1713, 1738,
    1773, 1799, 1835, 1862, 1899, 1928, 1966, 1995, 2035, 2065, 2107, 2181, 2257, 2291, 2336,
    2418, 2503, 2541,
];

/// 104 standard DCS codes
pub const DCS_CODES: [u16; 104] = [
    23, 25, 26, 31, 32, 36, 43, 47, 51, 53, 54, 65, 71, 72, 73, 74, 114, 115, 116, 122, 125, 131,
    132, 134, 143, 145, 152, 155, 156, 162, 165, 172, 174, 205, 212, 223, 225, 226, 243, 244, 245,
    246, 251, 252, 255, 261, 263, 265, 266, 271, 274, 306, 311, 315, 325, 331, 332, 343, 346, 351,
    356, 364, 365, 371, 411, 412, 413, 423, 431, 432, 445, 446, 452, 454, 455, 462, 464, 465, 466,
    503, 506, 516, 523, 526, 532, 546, 565, 606, 612, 624, 627, 631, 632, 654, 662, 664, 703, 712,
    723, 731, 732, 734, 743, 754,
];

/// Highest assignable DMR radio or talkgroup ID
pub const MAX_CALL_ID: u32 = 16_776_415;

/// DMR color codes
pub const COLOR_CODES: std::ops::RangeInclusive<u8> = 0..=15;

pub fn is_valid_ctcss(tenths: u16) -> bool {
    CTCSS_TONES.contains(&tenths)
}

pub fn is_valid_dcs(code: u16) -> bool {
    DCS_CODES.contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_tables() {
        assert!(is_valid_ctcss(885));
        assert!(!is_valid_ctcss(880));
        assert!(is_valid_dcs(754));
        assert!(!is_valid_dcs(800));
        assert!(CTCSS_TONES.windows(2).all(|w| w[0] < w[1]));
        assert!(DCS_CODES.iter().all(|c| c.to_string().chars().all(|d| d < '8')));
    }
}
