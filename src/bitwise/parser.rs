// Parser combinators using nom for display strings
// Frequencies, offsets, timestamps, tones and hex as typed into a front-end

use nom::{
    bytes::complete::{tag, take_while_m_n},
    character::complete::{char, digit1, one_of, space1},
    combinator::{all_consuming, map_res, opt, recognize},
    multi::many1,
    sequence::preceded,
    IResult, Parser,
};

/// Decimal places in a displayed frequency
pub const FREQ_DECIMALS: usize = 5;

/// Run `parser` over the whole (trimmed) input
pub fn complete<'a, O, P>(parser: P, input: &'a str) -> Option<O>
where
    P: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    all_consuming(parser)
        .parse(input.trim())
        .ok()
        .map(|(_, value)| value)
}

fn decimal_units(whole: &str, frac: &str, places: usize) -> Result<u64, &'static str> {
    if frac.len() > places {
        return Err("too many decimal places");
    }
    let whole: u64 = whole.parse().map_err(|_| "integer part out of range")?;
    let frac: u64 = if frac.is_empty() {
        0
    } else {
        format!("{:0<width$}", frac, width = places)
            .parse()
            .map_err(|_| "bad fraction")?
    };
    whole
        .checked_mul(10u64.pow(places as u32))
        .and_then(|w| w.checked_add(frac))
        .ok_or("value out of range")
}

/// `145.5` -> 14_550_000 (10 Hz units)
pub fn frequency(input: &str) -> IResult<&str, u64> {
    map_res(
        (digit1, opt(preceded(char('.'), digit1))),
        |(whole, frac): (&str, Option<&str>)| {
            decimal_units(whole, frac.unwrap_or(""), FREQ_DECIMALS)
        },
    )
    .parse(input)
}

/// `-5.0` / `+0.6` -> signed 10 Hz units
pub fn signed_frequency(input: &str) -> IResult<&str, i64> {
    map_res(
        (opt(one_of("+-")), frequency),
        |(sign, units): (Option<char>, u64)| {
            let units = i64::try_from(units).map_err(|_| "offset out of range")?;
            Ok::<i64, &'static str>(if sign == Some('-') { -units } else { units })
        },
    )
    .parse(input)
}

/// `88.5` -> 885 (tenths)
pub fn tenths(input: &str) -> IResult<&str, u64> {
    map_res(
        (digit1, opt(preceded(char('.'), digit1))),
        |(whole, frac): (&str, Option<&str>)| decimal_units(whole, frac.unwrap_or(""), 1),
    )
    .parse(input)
}

/// Signed decimal integer
pub fn integer(input: &str) -> IResult<&str, i64> {
    map_res(recognize((opt(one_of("+-")), digit1)), |s: &str| {
        s.parse::<i64>()
    })
    .parse(input)
}

fn fixed_digits<'a>(
    n: usize,
) -> impl Parser<&'a str, Output = u16, Error = nom::error::Error<&'a str>> {
    map_res(
        take_while_m_n(n, n, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse::<u16>(),
    )
}

/// `D023N` / `D754I` -> (octal code digits as decimal, inverted)
pub fn dcs(input: &str) -> IResult<&str, (u16, bool)> {
    map_res(
        (
            one_of("Dd"),
            take_while_m_n(3, 3, |c: char| ('0'..='7').contains(&c)),
            one_of("NnIiRr"),
        ),
        |(_, code, polarity): (char, &str, char)| {
            code.parse::<u16>()
                .map(|code| (code, !matches!(polarity, 'N' | 'n')))
        },
    )
    .parse(input)
}

/// Calendar fields of a `YYYY-MM-DD hh:mm:ss` timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeParts {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

pub fn timestamp(input: &str) -> IResult<&str, DateTimeParts> {
    let (rest, (year, _, month, _, day, _, hour, _, minute, _, second)) = (
        fixed_digits(4),
        char('-'),
        fixed_digits(2),
        char('-'),
        fixed_digits(2),
        space1,
        fixed_digits(2),
        char(':'),
        fixed_digits(2),
        char(':'),
        fixed_digits(2),
    )
        .parse(input)?;
    Ok((
        rest,
        DateTimeParts {
            year,
            month,
            day,
            hour,
            minute,
            second,
        },
    ))
}

/// Pairs of hex digits, optionally prefixed with `0x`
pub fn hex_bytes(input: &str) -> IResult<&str, Vec<u8>> {
    preceded(
        opt(tag("0x")),
        many1(map_res(
            take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
            |pair: &str| u8::from_str_radix(pair, 16),
        )),
    )
    .parse(input)
}

/// Format 10 Hz units as MHz with five decimals
pub fn format_frequency(units: u64) -> String {
    let scale = 10u64.pow(FREQ_DECIMALS as u32);
    format!(
        "{}.{:0width$}",
        units / scale,
        units % scale,
        width = FREQ_DECIMALS
    )
}

pub fn format_signed_frequency(units: i64) -> String {
    let sign = if units < 0 { "-" } else { "+" };
    format!("{}{}", sign, format_frequency(units.unsigned_abs()))
}
