/// STL file parser for binary and ASCII formats
use std::path::Path;

use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::opt,
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};
use thiserror::Error;

use crate::geometry::{Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

#[derive(Debug, Error)]
pub enum StlError {
    #[error("file too small to be a valid STL ({0} bytes)")]
    TooShort(usize),
    #[error("unexpected end of file: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("failed to parse ASCII STL: {0}")]
    Ascii(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, StlError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(StlError::TooShort(data.len()));
    }

    let body = &data[HEADER_LEN..];
    let (body, triangle_count) = le_u32::<_, nom::error::Error<&[u8]>>(body)
        .map_err(|_| StlError::TooShort(data.len()))?;
    let triangle_count = triangle_count as usize;

    let expected = HEADER_LEN + 4 + triangle_count * FACET_LEN;
    if data.len() < expected {
        return Err(StlError::Truncated {
            expected,
            actual: data.len(),
        });
    }

    let (_, triangles) = count(binary_facet, triangle_count)(body).map_err(|_| {
        StlError::Truncated {
            expected,
            actual: data.len(),
        }
    })?;

    let mut mesh = Mesh::with_capacity(triangle_count);
    for triangle in triangles {
        mesh.add_triangle(triangle);
    }
    Ok(mesh)
}

fn binary_triple(input: &[u8]) -> IResult<&[u8], (f32, f32, f32)> {
    tuple((le_f32, le_f32, le_f32))(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, (nx, ny, nz)) = binary_triple(input)?;
    let (input, corners) = count(binary_triple, 3)(input)?;
    // Attribute byte count, unused
    let (input, _) = le_u16(input)?;

    let vertex = |(x, y, z): (f32, f32, f32)| Vertex::new(x, y, z, nx, ny, nz);
    Ok((
        input,
        Triangle::new(vertex(corners[0]), vertex(corners[1]), vertex(corners[2])),
    ))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, StlError> {
    match parse_ascii_stl_impl(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(StlError::Ascii(format!("{:?}", e))),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    // Optional solid name runs to the end of the line
    let (input, _) = not_line_ending(input)?;
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = opt(not_line_ending)(input)?;

    let mut mesh = Mesh::with_capacity(triangles.len());
    for triangle in triangles {
        mesh.add_triangle(triangle);
    }

    Ok((input, mesh))
}

fn parse_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input, normal)?;
    let (input, v2) = parse_vertex(input, normal)?;
    let (input, v3) = parse_vertex(input, normal)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, Triangle::new(v1, v2, v3)))
}

fn parse_vertex(input: &str, normal: (f32, f32, f32)) -> IResult<&str, Vertex> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, (x, y, z)) = parse_vector3(input)?;
    Ok((input, Vertex::new(x, y, z, normal.0, normal.1, normal.2)))
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

/// Detect and parse STL data (binary or ASCII).
///
/// Binary files are allowed to start with `solid` in their header, so a
/// failed ASCII parse falls back to the binary layout.
pub fn parse_stl(data: &[u8]) -> Result<Mesh, StlError> {
    if data.len() > 5 && &data[0..5] == b"solid" {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}

/// Read and parse an STL file from disk
pub fn load_stl(path: &Path) -> Result<Mesh, StlError> {
    let data = std::fs::read(path)?;
    parse_stl(&data)
}
