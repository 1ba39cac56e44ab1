//! Break surface served to the browser when a work session ends

/// Static break page. The breathing and step-away exercises are plain
/// client-side timers with no shared state.
pub const BREAK_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Mindful Breaks</title>
  <style>
    body { font-family: sans-serif; text-align: center; margin-top: 3em; }
    button { margin: 0.5em; padding: 0.6em 1.2em; }
    #countdown { font-size: 2em; }
  </style>
</head>
<body>
  <h1>Time for a Break!</h1>
  <p>Take a breather 🌊</p>
  <button id="breatheBtn">Breathe</button>
  <button id="stepAwayBtn">Step away</button>
  <div id="exerciseArea"></div>
  <script>
    const area = document.getElementById("exerciseArea");
    let exercise;

    document.getElementById("breatheBtn").addEventListener("click", () => {
      clearInterval(exercise);
      const phases = ["Breathe in...", "Hold...", "Breathe out..."];
      let phase = 0;
      area.innerHTML = `<p id="breatheText">${phases[0]}</p>`;
      exercise = setInterval(() => {
        phase = (phase + 1) % phases.length;
        document.getElementById("breatheText").textContent = phases[phase];
      }, 4000);
    });

    document.getElementById("stepAwayBtn").addEventListener("click", () => {
      clearInterval(exercise);
      let time = 300;
      area.innerHTML = `<p>Step away for <strong>5 minutes</strong>.</p><p id="countdown">05:00</p>`;
      exercise = setInterval(() => {
        time--;
        const m = String(Math.floor(time / 60)).padStart(2, "0");
        const s = String(time % 60).padStart(2, "0");
        document.getElementById("countdown").textContent = time > 0 ? `${m}:${s}` : "Time's up!";
        if (time <= 0) clearInterval(exercise);
      }, 1000);
    });
  </script>
</body>
</html>
"#;
