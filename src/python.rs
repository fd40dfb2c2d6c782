use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::{CommandLineNode, Params, Separator, Token};

fn tokens_to_list<'py>(py: Python<'py>, tokens: &[Token]) -> PyResult<Bound<'py, PyList>> {
    let list = PyList::empty(py);
    for t in tokens {
        list.append(t.to_string())?;
    }
    Ok(list)
}

fn node_to_dict<'py>(py: Python<'py>, node: &CommandLineNode) -> PyResult<Bound<'py, PyDict>> {
    let out = PyDict::new(py);
    match &node.line_range {
        Some(r) => {
            out.set_item("start", tokens_to_list(py, &r.start)?)?;
            out.set_item("end", tokens_to_list(py, &r.end)?)?;
            let sep = match r.separator {
                Some(Separator::Comma) => Some(","),
                Some(Separator::Semicolon) => Some(";"),
                None => None,
            };
            out.set_item("separator", sep)?;
        }
        None => {
            out.set_item("start", PyList::empty(py))?;
            out.set_item("end", PyList::empty(py))?;
            out.set_item("separator", py.None())?;
        }
    }

    match &node.command {
        Some(c) => {
            out.set_item("command", c.name)?;
            out.set_item("target", c.target)?;
            out.set_item("forced", c.forced)?;
            let params = PyDict::new(py);
            params.set_item("file", c.params.file())?;
            if let Params::Write { append, .. } = &c.params {
                params.set_item("append", *append)?;
            }
            out.set_item("params", params)?;
        }
        None => {
            out.set_item("command", py.None())?;
            out.set_item("target", py.None())?;
            out.set_item("forced", false)?;
            out.set_item("params", PyDict::new(py))?;
        }
    }
    Ok(out)
}

#[pyfunction]
fn parse<'py>(py: Python<'py>, line: &str) -> PyResult<Bound<'py, PyDict>> {
    let node = crate::parse(crate::strip_prompt(line))
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    node_to_dict(py, &node)
}

#[pymodule]
fn excmd(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(parse, m)?)?;
    Ok(())
}
