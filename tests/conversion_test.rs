use mystq::{convert_myst_to_quarto, convert_quarto_to_myst};
use pretty_assertions::assert_eq;

#[test]
fn full_myst_document_converts_to_quarto() {
    let input = "\
# Analysis

```{note}
Check twice.
```

```{code-cell} ipython3
:tags: [remove-input]

import numpy as np
```

See {numref}`fig-one` and {cite}`a,b`.";

    let expected = "\
# Analysis

::: {.callout-note}
Check twice.
:::

```{python}
#| echo: false

import numpy as np
```

See @fig-one and [@a; @b].";

    assert_eq!(convert_myst_to_quarto(input), expected);
}

#[test]
fn full_quarto_document_converts_to_myst() {
    let input = "\
::: {.callout-warning}
Hot surface.
:::

```{python}
#| include: false
setup()
```

| a | b |
| - | - |

: Data {#tbl-data}

As @smith2020 shows, see @fig-one.";

    let expected = "\
```{warning}
Hot surface.
```

```{code-cell} python
:tags: [remove-cell]

setup()
```

```{table} Data
:name: tbl-data

| a | b |
| - | - |
```

As {cite:t}`smith2020` shows, see {numref}`fig-one`.";

    assert_eq!(convert_quarto_to_myst(input), expected);
}

#[test]
fn nested_admonitions_flatten_into_parent() {
    let input = "\
::::{tip}
Outer advice.

:::{note}
Inner detail.
:::
::::";

    let output = convert_myst_to_quarto(input);
    assert!(output.contains("::: {.callout-tip}"));
    assert!(output.contains("::: {.callout-note}"));
    assert!(output.contains("Inner detail."));
}

#[test]
fn figure_directive_becomes_attributed_image() {
    let input = "\
```{figure} plots/result.png
:name: fig-result
:width: 70%

Measured results over time.
```";

    assert_eq!(
        convert_myst_to_quarto(input),
        "![Measured results over time.](plots/result.png){#fig-result width=\"70%\"}"
    );
}

#[test]
fn attributed_image_becomes_figure_directive() {
    let input = "![Measured results over time.](plots/result.png){#fig-result width=\"70%\"}";

    let expected = "\
```{figure} plots/result.png
:name: fig-result
:width: 70%

Measured results over time.
```";

    assert_eq!(convert_quarto_to_myst(input), expected);
}

#[test]
fn labelled_math_round_trips() {
    let myst = "\
```{math}
:label: eq-energy

E = mc^2
```";

    let quarto = convert_myst_to_quarto(myst);
    assert_eq!(quarto, "$$\nE = mc^2\n$$ {#eq-energy}");
    assert_eq!(convert_quarto_to_myst(&quarto), "```{math}\n:label: eq-energy\n\nE = mc^2\n```");
}

#[test]
fn tab_set_round_trips() {
    let myst = "\
::::{tab-set}
:::{tab-item} Python
print(1)
:::
:::{tab-item} R
print(1)
:::
::::";

    let quarto = convert_myst_to_quarto(myst);
    assert_eq!(
        quarto,
        "::: {.panel-tabset}\n## Python\nprint(1)\n## R\nprint(1)\n:::"
    );

    let back = convert_quarto_to_myst(&quarto);
    assert_eq!(
        back,
        "::::{tab-set}\n:::{tab-item} Python\nprint(1)\n:::\n:::{tab-item} R\nprint(1)\n:::\n::::"
    );
}

#[test]
fn plain_code_fences_are_inert_in_both_directions() {
    let doc = "\
```python
# {cite}`not-a-citation`
email = \"user@example.com\"
```";

    assert_eq!(convert_myst_to_quarto(doc), doc);
    assert_eq!(convert_quarto_to_myst(doc), doc);
}

#[test]
fn eq_role_gains_prefix_and_keeps_it() {
    let quarto = convert_myst_to_quarto("{eq}`energy`");
    assert_eq!(quarto, "@eq-energy");
    // The prefix is applied forward and never stripped in reverse.
    assert_eq!(convert_quarto_to_myst(&quarto), "{eq}`eq-energy`");
}

#[test]
fn bibliography_and_abstract_directives_are_dropped() {
    let input = "\
Intro text.

```{bibliography}
```

Outro text.";

    let output = convert_myst_to_quarto(input);
    assert!(!output.contains("bibliography"));
    assert!(output.contains("Intro text."));
    assert!(output.contains("Outro text."));
}

#[test]
fn unknown_directive_survives_with_warning_marker() {
    let input = "\
```{exotic} arg
:opt: val

body line
```";

    let output = convert_myst_to_quarto(input);
    assert!(output.contains("<!-- WARNING: unknown MyST directive 'exotic' -->"));
    assert!(output.contains("```{exotic} arg"));
    assert!(output.contains(":opt: val"));
    assert!(output.contains("body line"));
}

#[test]
fn unclosed_directive_is_forced_closed_at_eof() {
    let input = "\
```{note}
Last words";

    let output = convert_myst_to_quarto(input);
    assert_eq!(output, "::: {.callout-note}\nLast words\n:::");
}

#[test]
fn margin_content_round_trips() {
    let myst = "\
```{margin}
A side note.
```";

    let quarto = convert_myst_to_quarto(myst);
    assert_eq!(quarto, "::: {.column-margin}\nA side note.\n:::");
    assert_eq!(convert_quarto_to_myst(&quarto), myst);
}
