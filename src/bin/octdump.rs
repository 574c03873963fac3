use std::io;
use std::process;
use std::sync::Arc;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use octetview::datastruct::{self, FieldType};
use octetview::{
    Artifact, Chs, Disk, Geometry, Image, OctetError, OctetView, TypeCase, ViewOptions,
};

// Possible exit codes
static _EXIT_SUCCESS: i32 = 0;
static EXIT_FAILURE: i32 = 1;

fn main() {
    // Diagnostics go to stderr so they never mix with the dump
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    // Parse command-line arguments
    let app = App::new("Octet View")
        .version("0.1.0")
        .about("Examine the structure of raw disk, tape, and block device images.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(Arg::with_name("image").required(true))
        .arg(
            Arg::with_name("typecase")
                .short("t")
                .long("typecase")
                .takes_value(true)
                .possible_values(TypeCase::builtin_names())
                .default_value("ascii")
                .help("Character set used to decode text"),
        )
        .arg(
            Arg::with_name("width")
                .short("w")
                .long("width")
                .takes_value(true)
                .validator(positive_validator)
                .default_value("16")
                .help("Bytes per hexdump line"),
        )
        .arg(
            Arg::with_name("sectors")
                .long("sectors")
                .takes_value(true)
                .validator(positive_u32_validator)
                .conflicts_with("block-size")
                .help("Sectors per track; enables cylinder/head/sector addressing"),
        )
        .arg(
            Arg::with_name("heads")
                .long("heads")
                .takes_value(true)
                .validator(positive_u32_validator)
                .default_value("1")
                .help("Heads (sides) per cylinder"),
        )
        .arg(
            Arg::with_name("sector-size")
                .long("sector-size")
                .takes_value(true)
                .validator(positive_validator)
                .default_value("256")
                .help("Bytes per sector"),
        )
        .arg(
            Arg::with_name("first-sector")
                .long("first-sector")
                .takes_value(true)
                .validator(u32_validator)
                .default_value("0")
                .help("Number of the first sector in each track"),
        )
        .arg(
            Arg::with_name("offset")
                .long("offset")
                .takes_value(true)
                .validator(number_validator)
                .default_value("0")
                .help("Bytes of header preceding the first sector"),
        )
        .arg(
            Arg::with_name("block-size")
                .long("block-size")
                .takes_value(true)
                .validator(positive_validator)
                .help("Divide the image into fixed-size blocks"),
        )
        .subcommand(
            SubCommand::with_name("dump")
                .about("Render an annotated dump of the image.")
                .arg(
                    Arg::with_name("field")
                        .short("f")
                        .long("field")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1)
                        .validator(field_validator)
                        .help("Claim a typed value, as OFFSET:TYPE (e.g. 0x20:le16, 4:rtext8)"),
                )
                .arg(
                    Arg::with_name("no-keys")
                        .long("no-keys")
                        .help("Do not tag lines with record keys"),
                ),
        )
        .subcommand(SubCommand::with_name("gaps").about("List unclaimed intervals."))
        .subcommand(
            SubCommand::with_name("text")
                .about("Decode a span of the image as text.")
                .arg(
                    Arg::with_name("offset")
                        .validator(number_validator)
                        .required(true),
                )
                .arg(
                    Arg::with_name("length")
                        .validator(positive_validator)
                        .required(true),
                )
                .arg(
                    Arg::with_name("long")
                        .short("l")
                        .long("long")
                        .help("Show full-fidelity glyphs"),
                ),
        )
        .subcommand(SubCommand::with_name("records").about("List physical records."));

    let mut app_clone = app.clone();
    let matches = app.get_matches();

    let result = match matches.subcommand() {
        ("dump", Some(m)) => cmd_dump(&matches, m),
        ("gaps", Some(_)) => cmd_gaps(&matches),
        ("text", Some(m)) => cmd_text(
            &matches,
            number(m.value_of("offset")),
            number(m.value_of("length")),
            m.is_present("long"),
        ),
        ("records", Some(_)) => cmd_records(&matches),
        _ => {
            let _ = app_clone.print_help();
            println!();
            process::exit(EXIT_FAILURE);
        }
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(EXIT_FAILURE);
    }
}

/// Parse a decimal or 0x-prefixed hexadecimal number.
fn parse_number(v: &str) -> Result<usize, String> {
    let parsed = match v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => v.parse::<usize>(),
    };
    parsed.map_err(|_| format!("Expected a decimal or 0x-prefixed number, not \"{}\".", v))
}

fn number_validator(v: String) -> Result<(), String> {
    parse_number(&v).map(|_| ())
}

/// Require a number greater than zero.
fn positive_validator(v: String) -> Result<(), String> {
    match parse_number(&v)? {
        0 => Err("Expected a number greater than zero.".to_string()),
        _ => Ok(()),
    }
}

/// Require a number that fits in 32 bits.
fn u32_validator(v: String) -> Result<(), String> {
    if parse_number(&v)? > u32::max_value() as usize {
        return Err(format!("Expected a number no greater than {}.", u32::max_value()));
    }
    Ok(())
}

/// Require a positive number that fits in 32 bits.
fn positive_u32_validator(v: String) -> Result<(), String> {
    positive_validator(v.clone())?;
    u32_validator(v)
}

/// Parse an OFFSET:TYPE pair.
fn parse_field(v: &str) -> Result<(usize, FieldType), String> {
    let (offset, field_type) = match v.find(':') {
        Some(colon) => (&v[..colon], &v[colon + 1..]),
        None => return Err(format!("Expected OFFSET:TYPE, not \"{}\".", v)),
    };
    let field_type = field_type
        .parse::<FieldType>()
        .map_err(|e| e.to_string())?;
    Ok((parse_number(offset)?, field_type))
}

fn field_validator(v: String) -> Result<(), String> {
    parse_field(&v).map(|_| ())
}

/// Extract an already-validated number.
fn number(v: Option<&str>) -> usize {
    v.and_then(|v| parse_number(v).ok()).unwrap_or(0)
}

/// Build the geometry requested on the command line, if any.  The number of
/// cylinders is inferred from the image size.
fn geometry(matches: &ArgMatches, len: usize) -> io::Result<Option<Geometry>> {
    if matches.is_present("block-size") {
        return Ok(Some(Geometry::Blocks(number(matches.value_of("block-size")))));
    }
    if !matches.is_present("sectors") {
        return Ok(None);
    }
    let chs = chs_geometry(
        number(matches.value_of("sectors")),
        number(matches.value_of("heads")),
        number(matches.value_of("sector-size")),
        number(matches.value_of("first-sector")),
        number(matches.value_of("offset")),
        len,
    )?;
    Ok(Some(Geometry::Chs(chs)))
}

/// Fit as many whole cylinders as an image of `len` bytes holds after
/// `offset`.  Fails with `Geometry` if there are none or any quantity is out
/// of range.
fn chs_geometry(
    sectors: usize,
    heads: usize,
    sector_size: usize,
    first_sector: usize,
    offset: usize,
    len: usize,
) -> io::Result<Chs> {
    let to_u32 = |v: usize| u32::try_from(v).map_err(|_| OctetError::Geometry);
    let cylinder_size = sectors
        .checked_mul(heads)
        .and_then(|v| v.checked_mul(sector_size))
        .filter(|&v| v > 0)
        .ok_or(OctetError::Geometry)?;
    let cylinders = len.saturating_sub(offset) / cylinder_size;
    let last_sector = first_sector
        .checked_add(sectors - 1)
        .and_then(|last| u32::try_from(last).ok());
    if cylinders == 0 || last_sector.is_none() {
        return Err(OctetError::Geometry.into());
    }
    Ok(
        Chs::new(to_u32(cylinders)?, to_u32(heads)?, to_u32(sectors)?, sector_size)
            .first_sector(to_u32(first_sector)?)
            .offset(offset),
    )
}

/// Open the image, divided into records if a geometry was requested.
fn open_artifact(matches: &ArgMatches) -> io::Result<Box<dyn Artifact>> {
    let path = matches.value_of("image").unwrap_or_default();
    let image = Image::open(path)?;
    match geometry(matches, image.len())? {
        Some(geometry) => {
            debug!(?geometry, "using geometry");
            Ok(Box::new(Disk::new(image, geometry)?))
        }
        None => Ok(Box::new(image)),
    }
}

fn typecase(matches: &ArgMatches) -> io::Result<Arc<TypeCase>> {
    let name = matches.value_of("typecase").unwrap_or("ascii");
    TypeCase::by_name(name)
        .map(Arc::new)
        .ok_or_else(|| OctetError::UnknownTypeCase(name.to_string()).into())
}

fn options(matches: &ArgMatches) -> ViewOptions {
    ViewOptions {
        width: number(matches.value_of("width")),
        ..ViewOptions::default()
    }
}

fn cmd_dump(matches: &ArgMatches, m: &ArgMatches) -> io::Result<()> {
    let artifact = open_artifact(matches)?;
    let options = ViewOptions {
        show_keys: !m.is_present("no-keys"),
        ..options(matches)
    };
    let mut view = OctetView::new(&*artifact, typecase(matches)?, options)?;
    if let Some(fields) = m.values_of("field") {
        for field in fields {
            let (offset, field_type) =
                parse_field(field).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            view.claim(offset, &field_type)?;
        }
    }
    for line in view.render() {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_gaps(matches: &ArgMatches) -> io::Result<()> {
    let artifact = open_artifact(matches)?;
    let view = OctetView::new(&*artifact, typecase(matches)?, options(matches))?;
    for gap in view.gaps() {
        println!("{} {:>10} bytes", gap, gap.len());
    }
    Ok(())
}

fn cmd_text(matches: &ArgMatches, offset: usize, length: usize, long: bool) -> io::Result<()> {
    let artifact = open_artifact(matches)?;
    let view = OctetView::new(&*artifact, typecase(matches)?, options(matches))?;
    let region = view.read(offset, &datastruct::text(length))?;
    if let Some(text) = region.as_text() {
        if long {
            println!("{}", text.long());
        } else {
            println!("{}", text.short());
        }
        let census = view.typecase().census(text.raw());
        println!(
            "valid={} visible={} ignored={} invalid={}{}",
            text.is_valid(),
            census.visible,
            census.ignored,
            census.invalid,
            census
                .eof
                .map(|eof| format!(" eof={}", eof))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn cmd_records(matches: &ArgMatches) -> io::Result<()> {
    let artifact = open_artifact(matches)?;
    let records = artifact.records();
    if records.is_empty() {
        eprintln!("No physical records; specify --sectors or --block-size.");
    }
    for record in records {
        println!(
            "{:<16} [0x{:08x}, 0x{:08x}) {} bytes",
            record.key.to_string(),
            record.lo,
            record.hi,
            record.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chs_geometry() {
        let chs = chs_geometry(2, 1, 32, 1, 0, 128).unwrap();
        assert_eq!((chs.cylinders, chs.heads, chs.sectors), (2, 1, 2));
        assert_eq!((chs.sector_size, chs.first_sector), (32, 1));

        // Too small for one cylinder
        let error = chs_geometry(2, 1, 32, 0, 100, 128).unwrap_err();
        assert_eq!(OctetError::from_io_error(&error), Some(OctetError::Geometry));
    }

    #[test]
    fn test_chs_geometry_overflow() {
        let huge = usize::max_value() / 2 + 1;
        let error = chs_geometry(huge, 2, 256, 0, 0, 4096).unwrap_err();
        assert_eq!(OctetError::from_io_error(&error), Some(OctetError::Geometry));
        let error = chs_geometry(huge, 1, 2, 0, 0, 4096).unwrap_err();
        assert_eq!(OctetError::from_io_error(&error), Some(OctetError::Geometry));
        let error = chs_geometry(2, 1, 1, 0, 0, usize::max_value()).unwrap_err();
        assert_eq!(OctetError::from_io_error(&error), Some(OctetError::Geometry));
        let error = chs_geometry(1, 1, 1, 1 << 32, 0, 16).unwrap_err();
        assert_eq!(OctetError::from_io_error(&error), Some(OctetError::Geometry));
        let last = u32::max_value() as usize;
        assert!(chs_geometry(1, 1, 1, last, 0, 16).is_ok());
        let error = chs_geometry(2, 1, 1, last, 0, 16).unwrap_err();
        assert_eq!(OctetError::from_io_error(&error), Some(OctetError::Geometry));
    }

    #[test]
    fn test_u32_validators() {
        assert!(u32_validator("4294967295".to_string()).is_ok());
        assert!(u32_validator("0x100000000".to_string()).is_err());
        assert!(positive_u32_validator("0".to_string()).is_err());
        assert!(positive_u32_validator("4294967296".to_string()).is_err());
        assert!(positive_u32_validator("18".to_string()).is_ok());
    }
}
