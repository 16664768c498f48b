//! Emission and photoluminescence wavelengths.
//!
//! Both models read `λ` with a subscript (`λPL`, `λ em`, `λmax, FL`) or a
//! phrase (`emission maximum`, `PL spectrum peaked at`). Photoluminescence
//! wavelengths take PL, fluorescence and emission spectra; emission
//! wavelengths also take electroluminescence and phosphorescence.

use layered_extract::actions::{join, merge};
use layered_extract::{i, optional, r, skip_to, w, Element};
use layered_extract_auto::AutoResult;
use layered_extract_model::{Field, Schema, SchemaRef};

use crate::condition::{self, phase_phrase, room_temperature_phrase, solvent_phrase, temperature_phrase};
use crate::dimensions;

const LAMBDA: &str = "^[λ𝛌𝜆𝝀𝝺𝞴]$";

const LAMBDA_PL: &str = r"^[λ𝛌𝜆𝝀𝝺𝞴](([Pp][Ll])|([Ee][Mm])|([Ff][Ll](uo)?))\w?$";
const LAMBDA_PL_MAX: &str = r"^[λ𝛌𝜆𝝀𝝺𝞴](([Pp][Ll])|([Ee][Mm])|([Ff][Ll](uo)?))?([Mm]ax)?\w?$";
const MAX_BEFORE_PL: &str = r"^([λ𝛌𝜆𝝀𝝺𝞴]|(PL))[Mm]ax\w?$";

const LAMBDA_EM: &str = r"^[λ𝛌𝜆𝝀𝝺𝞴](([Pp][Ll])|([Ee][Mm])|([Ee][Ll])|([Pp][Hh]o?s?)|([Ff][Ll](uo)?))\w?$";
const LAMBDA_EM_MAX: &str =
    r"^[λ𝛌𝜆𝝀𝝺𝞴](([Pp][Ll])|([Ee][Mm])|([Ee][Ll])|([Pp][Hh]o?s?)|([Ff][Ll](uo)?))?([Mm]ax)?\w?$";
const MAX_BEFORE_EM: &str = r"^([λ𝛌𝜆𝝀𝝺𝞴]|(PL)|(EL))[Mm]ax\w?$";

fn photoluminescence_kind() -> Element {
    r(r"^[Ee][Mm]\w?$") | r(r"^[Pp][Ll]\w?$") | r(r"^[Ff][Ll](uo)?\w?$")
}

fn emission_kind() -> Element {
    photoluminescence_kind() | r(r"^[Ee][Ll]\w?$") | r(r"^[Pp][Hh]o?s?\w?$")
}

fn maximum() -> Element {
    r("^[Mm]axim(um|a)$")
}

/// Where a spectrum peaks: `peaked`, `centred`, `maximum wavelength`.
fn peak() -> Element {
    r("^peaks?(ed)?$") | r("^cent(er|re)(s|d)?$") | w("around") | w("wavelength") | (maximum() + optional(i("wavelength")))
}

/// Specifier alternatives shared by both models; `kind` is the subscript of
/// `λ`, `spectra` the words naming a spectrum.
fn wavelength_specifier(kind: Element, joined: &str, joined_max: &str, max_first: &str, spectra: Element) -> Element {
    let separator = r("^[,;]$");
    let max = r(r"^[Mm]ax\w?$");

    let subscript =
        (kind.clone() + optional(separator.clone() + max.clone())) | (max.clone() + separator.clone() + kind.clone());
    let named = (i("emission") | i("emitting") | spectra.clone())
        + (i("wavelength") | r("^[pP]eaks?(ing)?$") | maximum());
    let peaked = spectra.clone()
        + optional(r("^spectr(um|a)$") | r("^intensit(y|ies)$"))
        + skip_to(peak()).hide()
        + peak();
    let peak_of = ((i("peak") + r("^wavelengths?$")) | r("^positions?$"))
        + i("of")
        + (spectra | i("emission"))
        + r("^spectr(um|a)$");
    let emitted = r("^emit(ted|ting)?s?$")
        + skip_to((i("peak") | i("maximum")) + r("^wavelengths?$")).hide()
        + (i("peak") | i("maximum"))
        + r("^wavelengths?$");

    ((r(LAMBDA) + subscript).with_action(merge)
        | (r(joined) + optional(separator.clone() + max)).with_action(merge)
        | (r(max_first) + separator + kind).with_action(merge)
        | r(joined_max)
        | named
        | peaked
        | peak_of
        | emitted)
        .with_action(join)
}

/// `PL`, `λPL`, `λ em`, `λmax, FL`, `PL spectrum peaked at`.
pub fn photoluminescence_specifier() -> Element {
    let spectra = i("photoluminescence") | w("PL") | i("fluorescence") | i("emission");
    w("PL") | wavelength_specifier(photoluminescence_kind(), LAMBDA_PL, LAMBDA_PL_MAX, MAX_BEFORE_PL, spectra)
}

/// `λem`, `λEL`, `λ Ph, max`, `phosphorescence peak`.
pub fn emission_specifier() -> Element {
    let spectra = i("phosphorescence")
        | i("fluorescence")
        | i("electroluminescence")
        | i("photoluminescence")
        | w("PL")
        | w("EL");
    wavelength_specifier(emission_kind(), LAMBDA_EM, LAMBDA_EM_MAX, MAX_BEFORE_EM, spectra)
}

pub fn photoluminescence_wavelength(compound: &SchemaRef) -> AutoResult<SchemaRef> {
    let temperature = condition::temperature()?;
    let schema = Schema::builder("PhotoluminescenceWavelength")
        .quantity(dimensions::length()?)
        .field(Field::string("specifier").required().parse(photoluminescence_specifier()))
        .field(Field::model("compound", compound).contextual())
        .field(Field::model("solvent", &condition::solvent()?).parse(solvent_phrase()))
        .field(Field::model("temperature", &temperature).parse(temperature_phrase(&temperature)?))
        .field(Field::model("room_temperature", &condition::room_temperature()?).parse(room_temperature_phrase()))
        .build()?;
    Ok(schema)
}

pub fn emission_wavelength(compound: &SchemaRef) -> AutoResult<SchemaRef> {
    let schema = Schema::builder("EmissionWavelength")
        .quantity(dimensions::length()?)
        .field(Field::string("specifier").required().parse(emission_specifier()))
        .field(Field::model("compound", compound).contextual())
        .field(Field::model("phase", &condition::phase()?).parse(phase_phrase()))
        .build()?;
    Ok(schema)
}
