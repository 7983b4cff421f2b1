// The fixed-width text reports: the organizer tree and the data-quality summary.

use std::io::{self, Write};

use organizer_tree::quality::QualityTally;
use organizer_tree::traversal::{keep_all, walk, ChildOrder, TreeRow};

use crate::empower::io_common::format_mts;
use crate::empower::*;

const ENGLISH_HEADER: [&str; 7] = [
    "Names are arranged hierarchically, indentation shows organizer -> vocero relationship.",
    "Organizer and voter numbers are cumulative --",
    "the organizer/voter count for an organizer/vocero is the sum of their",
    "organizer/voter count and the organizer/voter count of",
    "all of the organizers/voceros below them.",
    "Activation numbers are non-cumulative and show activation by a vocero of a personal",
    "contact, for the active calls to action.",
];

const SPANISH_HEADER: [&str; 7] = [
    "Los nombres están ordenados jerárquicamente, la sangría muestra relación organizador -> vocero.",
    "Los números de organizadores y votantes son acumulativos --",
    "el recuento de organizadores/votantes para un organizador/vocero es la suma de su",
    "recuento de organizadores/votantes y el recuento de organizadores/votantes",
    "de todos los organizadores/voceros abajo.",
    "Los números de activación no son acumulativos y muestran la activación por un vocero de un",
    "contacto personal, para las llamadas a la acción activas.",
];

pub fn write_header<W: Write>(w: &mut W, spanish: bool, with_voters: bool) -> io::Result<()> {
    let (lines, voters_line, super_line, columns) = if spanish {
        (
            SPANISH_HEADER,
            "Voceros se enumeran a continuación organizadores, los votantes se enumeran a continuación voceros.",
            "'Supervoceros' son organizadores que tienen más de 0 organizadores debajo de ellos.",
            ["Nombre, ID", "Teléfono", "Organizadores", "Votantes", "Activación"],
        )
    } else {
        (
            ENGLISH_HEADER,
            "Voceros are listed below organizers, voters are listed below voceros.",
            "'Supervoceros' are organizers who have more than 0 organizers below them.",
            ["Name, ID", "Phone", "Organizers", "Voters", "Activation"],
        )
    };
    writeln!(w)?;
    for l in lines.iter() {
        writeln!(w, " {}", l)?;
    }
    if with_voters {
        writeln!(w, " {}", voters_line)?;
    }
    writeln!(w, " {}", super_line)?;
    writeln!(w)?;
    writeln!(
        w,
        " {:<46} {:>5} {:>18} {:>9} {:>15}",
        columns[0], columns[1], columns[2], columns[3], columns[4]
    )?;
    writeln!(
        w,
        " {:<46} {:>13} {:>10} {:>10} {:>15}",
        "_".repeat(46),
        "_".repeat(13),
        "_".repeat(10),
        "_".repeat(8),
        "_".repeat(12)
    )
}

/// Writes the tree below `start`, best activation first.
///
/// In verbose mode every organizer line ends with the chain of organizers
/// above it.
pub fn write_tree<W: Write>(
    w: &mut W,
    tree: &OrganizerTree,
    start: NodeId,
    verbose: bool,
    show_voters: bool,
) -> io::Result<()> {
    let order = ChildOrder::ByRate(ActivationScope::Active);
    for row in walk(tree, start, order, show_voters, &keep_all) {
        match row {
            TreeRow::Organizer { node, level } => {
                write_organizer_line(w, tree, node, level, verbose)?
            }
            TreeRow::Voters { organizer, level } => {
                write_voter_lines(w, tree, organizer, level, verbose)?
            }
        }
    }
    writeln!(w)
}

fn write_organizer_line<W: Write>(
    w: &mut W,
    tree: &OrganizerTree,
    id: NodeId,
    level: usize,
    verbose: bool,
) -> io::Result<()> {
    let name = format!("{}{}", "-".repeat(level * DEPTH_STEP), tree.display_name(id));
    write!(
        w,
        " {:<45} {:>15} {:>5} {:>12} {:>10.2} {:<9}",
        name,
        tree.get(id).contact.phone,
        tree.organizer_count(id),
        tree.contact_count(id),
        tree.activation_rate(id, ActivationScope::Active),
        tree.activation_string(id)
    )?;
    if !verbose {
        return writeln!(w);
    }
    let ancestors = tree.ancestors(id);
    if ancestors.is_empty() {
        writeln!(w, "  is a terminal node.")
    } else {
        let names: Vec<String> = ancestors.iter().map(|a| tree.display_name(*a)).collect();
        writeln!(w, "  -> {}", names.join("-> "))
    }
}

fn write_voter_lines<W: Write>(
    w: &mut W,
    tree: &OrganizerTree,
    organizer: NodeId,
    level: usize,
    verbose: bool,
) -> io::Result<()> {
    let label = format!("{} Voter:", "-".repeat(level * DEPTH_STEP));
    let mut chain = vec![organizer];
    chain.extend(tree.ancestors(organizer));
    for v in tree.direct_contacts(organizer) {
        let c = &tree.get(*v).contact;
        write!(
            w,
            " {} {:<35} {:<18} {:<8} {:<12}",
            label,
            tree.display_name(*v),
            c.phone,
            "Created",
            format_mts(c.created_mts)
        )?;
        if verbose {
            for a in chain.iter() {
                write!(w, " ->  {}", tree.display_name(*a))?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

pub fn write_quality_summary<W: Write>(
    w: &mut W,
    source: &str,
    tally: &QualityTally,
    spanish: bool,
) -> io::Result<()> {
    let labels: [&str; 10] = if spanish {
        [
            "Calidad de los datos de",
            "Contactos",
            "Con VAN",
            "Sin teléfono",
            "Nombre incorrecto",
            "Apellido incorrecto",
            "Nombre no ASCII",
            "Apellido no ASCII",
            "Sin problemas",
            "Con VAN / datos incorrectos / sin VAN",
        ]
    } else {
        [
            "Data quality of",
            "Contacts",
            "VAN matched",
            "Missing phone",
            "Bad first name",
            "Bad last name",
            "Non-ASCII first name",
            "Non-ASCII last name",
            "Clean",
            "Matched / bad data / unmatched",
        ]
    };
    let counts = [
        tally.total(),
        tally.matched,
        tally.missing_phone,
        tally.bad_first_name,
        tally.bad_last_name,
        tally.non_ascii_first_name,
        tally.non_ascii_last_name,
        tally.clean,
    ];
    writeln!(w, " {} {}", labels[0], source)?;
    writeln!(w)?;
    for (label, count) in labels[1..9].iter().zip(counts.iter()) {
        writeln!(w, " {:<40} {:>8}", label, count)?;
    }
    writeln!(w)?;
    writeln!(
        w,
        " {:<40} {} / {} / {}",
        labels[9],
        tally.matched,
        tally.bad_data(),
        tally.unmatched()
    )
}
