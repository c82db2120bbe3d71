//! Text form of schedules, one node per line.
//!
//! ```text
//! domain: { S[i, j] : 0 <= i <= 7 and 0 <= j <= 7 }
//! band: { S[i, j] -> [(i), (j)] } permutable: [1, 1] coincident: [1, 1]
//!   leaf
//! ```

use std::fmt::{self, Write as _};

use crate::domain::InstanceSet;
use crate::node::{AstOption, Band, Node, Schedule};
use crate::statement::{Statement, StmtId};

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "domain: ")?;
        write_set(f, self, &self.domain())?;
        writeln!(f)?;
        write_node(f, self, &self.root, 0)
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, schedule: &Schedule, node: &Node, depth: usize) -> fmt::Result {
    write!(f, "{:indent$}", "", indent = depth * 2)?;
    match node {
        Node::Band { band, .. } => write_band(f, schedule, band)?,
        Node::Mark { tag, .. } => write!(f, "mark: {tag:?}")?,
        Node::Filter { filter, .. } => {
            write!(f, "filter: ")?;
            write_set(f, schedule, filter)?;
        }
        other => write!(f, "{}", other.kind())?,
    }
    writeln!(f)?;
    for child in node.children() {
        write_node(f, schedule, child, depth + 1)?;
    }
    Ok(())
}

fn tuple(stmt: &Statement) -> String {
    format!("{}[{}]", stmt.name, stmt.iterators.join(", "))
}

fn flags(band: &Band, flag: impl Fn(usize) -> bool) -> String {
    let values: Vec<_> = (0..band.n_member())
        .map(|pos| if flag(pos) { "1" } else { "0" })
        .collect();
    format!("[{}]", values.join(", "))
}

fn write_band(f: &mut fmt::Formatter<'_>, schedule: &Schedule, band: &Band) -> fmt::Result {
    let mut stmts: Vec<StmtId> = band
        .members
        .iter()
        .flat_map(|m| m.schedule.keys().copied())
        .collect();
    stmts.sort();
    stmts.dedup();

    let mut maps = Vec::with_capacity(stmts.len());
    for id in stmts {
        let stmt = schedule.statement(id);
        let mut map = format!("{} -> [", tuple(stmt));
        for (pos, member) in band.members.iter().enumerate() {
            if pos > 0 {
                map.push_str(", ");
            }
            match member.expr(id) {
                Some(expr) => write!(map, "({})", expr.display(&stmt.iterators))?,
                None => map.push_str("(0)"),
            }
        }
        map.push(']');
        maps.push(map);
    }
    write!(
        f,
        "band: {{ {} }} permutable: {} coincident: {}",
        maps.join("; "),
        flags(band, |pos| band.member(pos).permutable),
        flags(band, |pos| band.member(pos).coincident),
    )?;
    if band.ast_option != AstOption::Default {
        write!(f, " options: {}", band.ast_option)?;
    }
    Ok(())
}

fn write_set(f: &mut fmt::Formatter<'_>, schedule: &Schedule, set: &InstanceSet) -> fmt::Result {
    let pieces: Vec<String> = set
        .iter()
        .filter(|(_, piece)| !piece.is_empty())
        .map(|(id, piece)| {
            let stmt = schedule.statement(id);
            if piece.dims() == 0 {
                tuple(stmt)
            } else {
                format!("{} : {}", tuple(stmt), piece.display(&stmt.iterators))
            }
        })
        .collect();
    if pieces.is_empty() {
        write!(f, "{{ }}")
    } else {
        write!(f, "{{ {} }}", pieces.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::QuasiAffine;
    use crate::domain::{BoxSet, Interval};
    use crate::node::BandMember;
    use crate::statement::StmtId;

    fn schedule() -> Schedule {
        let s = StmtId::new(0);
        let statement = Statement {
            id: s,
            name: "S".to_owned(),
            iterators: vec!["i".to_owned(), "j".to_owned()],
            domain: BoxSet::new([Interval::extent(8), Interval::extent(6)]),
            accesses: Vec::new(),
        };
        let band = Band::new(vec![
            BandMember::new(true, true).with(s, QuasiAffine::var(2, 0)),
            BandMember::new(true, false).with(s, QuasiAffine::var(2, 1)),
        ]);
        Schedule::new(vec![statement], Node::band(band, Node::Leaf))
    }

    #[test]
    fn prints_band_tree() {
        insta::assert_snapshot!(schedule().to_string(), @r"
        domain: { S[i, j] : 0 <= i <= 7 and 0 <= j <= 5 }
        band: { S[i, j] -> [(i), (j)] } permutable: [1, 1] coincident: [1, 0]
          leaf
        ");
    }

    #[test]
    fn prints_tiles_marks_and_options() {
        let node = schedule()
            .into_root()
            .band_split(1)
            .child(0)
            .band_tile(&[4])
            .child(0)
            .band_set_ast_option(AstOption::NoUnroll)
            .insert_mark("SIMD");
        insta::assert_snapshot!(node.into_schedule().to_string(), @r#"
        domain: { S[i, j] : 0 <= i <= 7 and 0 <= j <= 5 }
        band: { S[i, j] -> [(i)] } permutable: [1] coincident: [1]
          band: { S[i, j] -> [(floor((j)/4))] } permutable: [1] coincident: [0]
            mark: "SIMD"
              band: { S[i, j] -> [((j) mod 4)] } permutable: [1] coincident: [0] options: no-unroll
                leaf
        "#);
    }
}
