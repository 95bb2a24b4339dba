use crate::foundation::core::Rgba8;
use crate::foundation::error::{CardError, CardResult};

/// Parse a CSS-style colour string.
///
/// Accepted forms: `#RGB`, `#RRGGBB`, `#RRGGBBAA`, `rgb(r, g, b)`, `rgba(r, g, b, a)`,
/// `hsl(h, s%, l%)`, `hsla(h, s%, l%, a)` and `transparent`. Channel values in `rgb()` are
/// `0..=255`, alpha is `0..=1`.
pub fn parse_color(input: &str) -> CardResult<Rgba8> {
    let s = input.trim();
    if s.eq_ignore_ascii_case("transparent") {
        return Ok(Rgba8::transparent());
    }
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex).map_err(|e| invalid(input, &e));
    }

    let lower = s.to_ascii_lowercase();
    let (name, args) = lower
        .split_once('(')
        .and_then(|(name, rest)| rest.strip_suffix(')').map(|args| (name.trim(), args)))
        .ok_or_else(|| invalid(input, "expected #hex, rgb(), rgba(), hsl() or hsla()"))?;
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();

    match (name, parts.len()) {
        ("rgb", 3) | ("rgba", 4) => {
            let r = channel_u8(parts[0]).map_err(|e| invalid(input, &e))?;
            let g = channel_u8(parts[1]).map_err(|e| invalid(input, &e))?;
            let b = channel_u8(parts[2]).map_err(|e| invalid(input, &e))?;
            let a = match parts.get(3) {
                Some(a) => alpha_u8(a).map_err(|e| invalid(input, &e))?,
                None => 255,
            };
            Ok(Rgba8::rgba(r, g, b, a))
        }
        ("hsl", 3) | ("hsla", 4) => {
            let h = number(parts[0]).map_err(|e| invalid(input, &e))?;
            let sat = percent(parts[1]).map_err(|e| invalid(input, &e))?;
            let l = percent(parts[2]).map_err(|e| invalid(input, &e))?;
            let a = match parts.get(3) {
                Some(a) => alpha_u8(a).map_err(|e| invalid(input, &e))?,
                None => 255,
            };
            let (r, g, b) = hsl_to_rgb(h, sat, l);
            Ok(Rgba8::rgba(r, g, b, a))
        }
        _ => Err(invalid(input, "wrong function name or argument count")),
    }
}

/// Parse every entry of a colour list, keeping order.
pub fn parse_colors<S: AsRef<str>>(inputs: &[S]) -> CardResult<Vec<Rgba8>> {
    inputs.iter().map(|c| parse_color(c.as_ref())).collect()
}

fn invalid(input: &str, why: &str) -> CardError {
    CardError::validation(format!("invalid color \"{input}\": {why}"))
}

fn parse_hex(s: &str) -> Result<Rgba8, String> {
    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }
    fn hex_nibble(c: &str) -> Result<u8, String> {
        let v = u8::from_str_radix(c, 16).map_err(|_| format!("invalid hex digit \"{c}\""))?;
        Ok(v * 17)
    }

    if !s.is_ascii() {
        return Err("hex color must be ascii".to_owned());
    }
    match s.len() {
        3 => Ok(Rgba8::rgb(
            hex_nibble(&s[0..1])?,
            hex_nibble(&s[1..2])?,
            hex_nibble(&s[2..3])?,
        )),
        6 => Ok(Rgba8::rgb(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Ok(Rgba8::rgba(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        )),
        _ => Err("hex color must be #RGB, #RRGGBB or #RRGGBBAA".to_owned()),
    }
}

fn number(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .trim_end_matches("deg")
        .trim()
        .parse()
        .map_err(|_| format!("invalid number \"{s}\""))?;
    if !v.is_finite() {
        return Err(format!("non-finite number \"{s}\""));
    }
    Ok(v)
}

fn channel_u8(s: &str) -> Result<u8, String> {
    Ok(number(s)?.round().clamp(0.0, 255.0) as u8)
}

fn alpha_u8(s: &str) -> Result<u8, String> {
    let a = match s.strip_suffix('%') {
        Some(p) => number(p)? / 100.0,
        None => number(s)?,
    };
    Ok((a.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn percent(s: &str) -> Result<f64, String> {
    let p = s
        .strip_suffix('%')
        .ok_or_else(|| format!("expected percentage, got \"{s}\""))?;
    Ok((number(p)? / 100.0).clamp(0.0, 1.0))
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    fn to_u8(x: f64) -> u8 {
        (x.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    if s == 0.0 {
        return (to_u8(l), to_u8(l), to_u8(l));
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;
    (
        to_u8(hue_to_rgb(p, q, h + 1.0 / 3.0)),
        to_u8(hue_to_rgb(p, q, h)),
        to_u8(hue_to_rgb(p, q, h - 1.0 / 3.0)),
    )
}
